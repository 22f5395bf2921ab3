/**
 * Routes Module
 * API route handlers
 */

pub mod admin;
pub mod auth;
pub mod blog;
pub mod contact;
pub mod health;
pub mod pages;
pub mod projects;
pub mod upload;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderMap,
    routing::{delete, get, patch, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ContentError, ContentResult};
use crate::store::auth::Claims;
use crate::AppState;

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Success response (for delete, logout)
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Extract bearer token from Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Admin guard: a valid access token that belongs to the live session.
pub fn require_admin(state: &AppState, headers: &HeaderMap) -> ContentResult<Claims> {
    let token = bearer_token(headers)
        .ok_or_else(|| ContentError::Auth("Authorization required".to_string()))?;
    let claims = state.auth.verify_access_token(token)?;
    if !state.session.is_current(&claims.sid) {
        return Err(ContentError::Auth("Session has ended".to_string()));
    }
    Ok(claims)
}

/// Every API and health route, with state applied.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/home", get(pages::home))
        .route("/api/about", get(pages::about))
        .route("/api/blogs", get(blog::list_blogs))
        .route("/api/blogs/{slug}", get(blog::get_blog))
        .route("/api/projects", get(projects::list_projects))
        .route("/api/projects/{slug}", get(projects::get_project))
        .route("/api/contact", post(contact::submit))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/session", get(auth::session))
        .route("/api/admin/dashboard", get(admin::dashboard))
        .route("/api/admin/dashboard/refresh", post(admin::refresh))
        .route("/api/admin/dashboard/{content_type}", put(admin::switch_type))
        .route("/api/admin/drafts", post(admin::new_draft))
        .route(
            "/api/admin/draft",
            patch(admin::change_field).delete(admin::cancel_draft),
        )
        .route("/api/admin/draft/save", post(admin::save_draft))
        .route(
            "/api/admin/draft/image",
            post(upload::upload_draft_image)
                .layer(DefaultBodyLimit::max(upload::MAX_REQUEST_BYTES)),
        )
        .route("/api/admin/items/{id}/edit", post(admin::edit_item))
        .route("/api/admin/items/{id}", delete(admin::delete_item))
        .route("/health", get(health::health_ping))
        .route("/health/detailed", get(health::health_detailed))
        .route("/health/ready", get(health::health_ready))
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(bearer_token(&headers).is_none());

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert!(bearer_token(&headers).is_none());

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[tokio::test]
    async fn test_require_admin_tracks_live_session() {
        let app = testing::TestApp::new();
        let mut headers = HeaderMap::new();
        assert!(require_admin(&app.state, &headers).is_err());

        let token = app.login().await;
        headers.insert(
            "authorization",
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        assert!(require_admin(&app.state, &headers).is_ok());

        app.state.auth.sign_out().await;
        assert!(matches!(
            require_admin(&app.state, &headers),
            Err(ContentError::Auth(_))
        ));
    }
}
