//! Error taxonomy shared by the content model, the store back-ends and the
//! HTTP layer.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::routes::ErrorResponse;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ContentError {
    /// A required field is missing or a value has the wrong shape.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The store already holds an item of the same type with this slug.
    #[error("Slug already exists: {0}")]
    SlugConflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The store could not be reached or the request failed in transit.
    #[error("Request failed: {0}")]
    Network(String),

    /// Object storage rejected or failed the write.
    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("An image upload is already in progress; retry once it finishes")]
    UploadInProgress,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Deletion must be explicitly confirmed")]
    ConfirmationRequired,

    /// The editor is not in a state that accepts the requested action.
    #[error("Invalid action: {0}")]
    InvalidTransition(&'static str),
}

pub type ContentResult<T> = Result<T, ContentError>;

impl ContentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ContentError::Validation(_) | ContentError::ConfirmationRequired => {
                StatusCode::BAD_REQUEST
            }
            ContentError::Auth(_) => StatusCode::UNAUTHORIZED,
            ContentError::NotFound(_) => StatusCode::NOT_FOUND,
            ContentError::SlugConflict(_)
            | ContentError::UploadInProgress
            | ContentError::InvalidTransition(_) => StatusCode::CONFLICT,
            ContentError::Upload(_) => StatusCode::BAD_GATEWAY,
            ContentError::Network(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<sqlx::Error> for ContentError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ContentError::NotFound("row".to_string()),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23502") => {
                ContentError::Validation(db_err.message().to_string())
            }
            _ => ContentError::Network(err.to_string()),
        }
    }
}

impl IntoResponse for ContentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "content operation failed");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
                message: None,
            }),
        )
            .into_response()
    }
}
