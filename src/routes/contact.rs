/**
 * Contact Routes
 * Contact form submission
 */
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::contact::ContactMessage;
use crate::error::ContentResult;
use crate::routes::SuccessResponse;
use crate::AppState;

/// POST /api/contact
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(message): Json<ContactMessage>,
) -> ContentResult<(StatusCode, Json<SuccessResponse>)> {
    message.validate()?;
    state.contact.deliver(&message).await?;
    Ok((StatusCode::ACCEPTED, Json(SuccessResponse { success: true })))
}
