/**
 * Page Routes
 * Home and About pages
 */
use axum::{extract::State, Json};
use std::sync::Arc;

use crate::content::catalog::{self, HomePage};
use crate::content::Profile;
use crate::error::{ContentError, ContentResult};
use crate::AppState;

/// GET /api/home - latest blogs and projects
pub async fn home(State(state): State<Arc<AppState>>) -> ContentResult<Json<HomePage>> {
    catalog::home(state.store.as_ref()).await.map(Json)
}

/// GET /api/about
pub async fn about(State(state): State<Arc<AppState>>) -> ContentResult<Json<Profile>> {
    state
        .store
        .profile()
        .await?
        .map(Json)
        .ok_or_else(|| ContentError::NotFound("profile".to_string()))
}
