/**
 * Project Routes
 * Public project list and project detail by slug
 */
use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::content::catalog;
use crate::content::Project;
use crate::error::{ContentError, ContentResult};
use crate::routes::blog::checked_slug;
use crate::AppState;

/// GET /api/projects - newest first
pub async fn list_projects(State(state): State<Arc<AppState>>) -> ContentResult<Json<Vec<Project>>> {
    catalog::projects(state.store.as_ref(), None).await.map(Json)
}

/// GET /api/projects/{slug}
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> ContentResult<Json<Project>> {
    let slug = checked_slug(&slug)?;
    catalog::project_by_slug(state.store.as_ref(), slug)
        .await?
        .map(Json)
        .ok_or_else(|| ContentError::NotFound(format!("project '{}'", slug)))
}
