/**
 * Admin Dashboard Routes
 * Drive the single server-side dashboard: switch type, open/edit/cancel
 * drafts, save and delete. Every handler requires the live admin session.
 */
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::content::dashboard::DashboardView;
use crate::content::{ContentItem, ContentType, DraftField};
use crate::error::{ContentError, ContentResult};
use crate::routes::require_admin;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub item: ContentItem,
    pub dashboard: DashboardView,
}

/// GET /api/admin/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ContentResult<Json<DashboardView>> {
    require_admin(&state, &headers)?;
    let mut dashboard = state.dashboard.lock().await;
    dashboard.ensure_loaded(state.store.as_ref()).await?;
    Ok(Json(dashboard.view()))
}

/// PUT /api/admin/dashboard/{content_type} - discards any draft
pub async fn switch_type(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(content_type): Path<String>,
) -> ContentResult<Json<DashboardView>> {
    require_admin(&state, &headers)?;
    let content_type = ContentType::parse(&content_type).ok_or_else(|| {
        ContentError::Validation(format!("unknown content type '{}'", content_type))
    })?;

    let mut dashboard = state.dashboard.lock().await;
    dashboard.open(state.store.as_ref(), content_type).await?;
    Ok(Json(dashboard.view()))
}

/// POST /api/admin/dashboard/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ContentResult<Json<DashboardView>> {
    require_admin(&state, &headers)?;
    let mut dashboard = state.dashboard.lock().await;
    dashboard.refresh(state.store.as_ref()).await?;
    Ok(Json(dashboard.view()))
}

/// POST /api/admin/drafts
pub async fn new_draft(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ContentResult<(StatusCode, Json<DashboardView>)> {
    require_admin(&state, &headers)?;
    let mut dashboard = state.dashboard.lock().await;
    dashboard.new_draft()?;
    Ok((StatusCode::CREATED, Json(dashboard.view())))
}

/// POST /api/admin/items/{id}/edit
pub async fn edit_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> ContentResult<Json<DashboardView>> {
    require_admin(&state, &headers)?;
    let mut dashboard = state.dashboard.lock().await;
    dashboard.ensure_loaded(state.store.as_ref()).await?;
    dashboard.edit(id)?;
    Ok(Json(dashboard.view()))
}

/// PATCH /api/admin/draft - body `{"field": ..., "value": ...}`
pub async fn change_field(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(change): Json<DraftField>,
) -> ContentResult<Json<DashboardView>> {
    require_admin(&state, &headers)?;
    let mut dashboard = state.dashboard.lock().await;
    dashboard.change_field(change)?;
    Ok(Json(dashboard.view()))
}

/// DELETE /api/admin/draft - cancel without saving
pub async fn cancel_draft(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ContentResult<Json<DashboardView>> {
    require_admin(&state, &headers)?;
    let mut dashboard = state.dashboard.lock().await;
    dashboard.cancel();
    Ok(Json(dashboard.view()))
}

/// POST /api/admin/draft/save
pub async fn save_draft(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ContentResult<Json<SaveResponse>> {
    require_admin(&state, &headers)?;
    let mut dashboard = state.dashboard.lock().await;
    let item = dashboard.save(state.store.as_ref()).await?;
    Ok(Json(SaveResponse {
        item,
        dashboard: dashboard.view(),
    }))
}

/// DELETE /api/admin/items/{id}?confirm=true
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
) -> ContentResult<Json<DashboardView>> {
    require_admin(&state, &headers)?;
    let mut dashboard = state.dashboard.lock().await;
    dashboard.ensure_loaded(state.store.as_ref()).await?;
    dashboard
        .delete(state.store.as_ref(), id, query.confirm)
        .await?;
    Ok(Json(dashboard.view()))
}
