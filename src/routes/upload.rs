/**
 * Upload Routes
 * Draft image upload: validates the multipart file and attaches its public
 * URL to the open draft's image field
 */
use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::content::dashboard;
use crate::routes::{require_admin, ErrorResponse};
use crate::AppState;

pub(crate) const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Multipart body cap for this route: one file plus framing.
pub(crate) const MAX_REQUEST_BYTES: usize = MAX_FILE_SIZE + 64 * 1024;
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub size: usize,
    pub mime_type: String,
}

fn validate_image_magic_bytes(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        // PNG: 89 50 4E 47
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        // GIF: 47 49 46 38
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        _ => "webp",
    }
}

fn file_extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    Some(ext.to_lowercase())
}

fn rejected(status: StatusCode, error: &str) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message: None,
        }),
    )
        .into_response()
}

/// POST /api/admin/draft/image (multipart, first field is the file)
pub async fn upload_draft_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    if let Err(e) = require_admin(&state, &headers) {
        return e.into_response();
    }

    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => return rejected(StatusCode::BAD_REQUEST, "No file provided"),
        Err(e) => {
            tracing::warn!("Multipart error: {}", e);
            return rejected(StatusCode::BAD_REQUEST, "Invalid multipart data");
        }
    };

    let original_name = field.file_name().unwrap_or_default().to_string();
    let allowed = file_extension(&original_name)
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));
    if !allowed {
        return rejected(
            StatusCode::BAD_REQUEST,
            "Unsupported file type. Allowed: JPEG, PNG, WebP, GIF.",
        );
    }

    let bytes = match field.bytes().await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!("Failed to read upload bytes: {}", e);
            // body limit overruns surface here as 413
            return rejected(e.status(), "Failed to read file data");
        }
    };

    if bytes.is_empty() {
        return rejected(StatusCode::BAD_REQUEST, "Empty file");
    }
    if bytes.len() > MAX_FILE_SIZE {
        return rejected(
            StatusCode::PAYLOAD_TOO_LARGE,
            "File too large. Maximum size is 5MB.",
        );
    }

    let Some(mime_type) = validate_image_magic_bytes(&bytes) else {
        return rejected(
            StatusCode::BAD_REQUEST,
            "File content does not match an allowed image type.",
        );
    };

    match dashboard::upload_image(
        &state.dashboard,
        state.objects.as_ref(),
        extension_for_mime(mime_type),
        &bytes,
    )
    .await
    {
        Ok(url) => (
            StatusCode::CREATED,
            Json(UploadResponse {
                url,
                size: bytes.len(),
                mime_type: mime_type.to_string(),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
