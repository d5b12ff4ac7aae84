//! File upload endpoint
//!
//! Stores uploaded files in the attachment store and hands back the ids
//! the chat widget sends with its next turn.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;

use relay_core::attachment::{AttachmentRepository, NewAttachment, StoredAttachment};

use super::{error_response, ApiError};
use crate::state::AppState;

/// Multipart field carrying files
const FILES_FIELD: &str = "files";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub files: Vec<StoredAttachment>,
}

/// POST /upload - Store one or more files
async fn upload_files(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<UploadResponse>, ApiError> {
    let mut files = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read multipart body: {}", e);
                return Err(error_response(StatusCode::BAD_REQUEST, e.body_text()));
            }
        };

        if field.name() != Some(FILES_FIELD) {
            continue;
        }

        let name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| "upload".to_string());
        let mime = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| {
            tracing::warn!("Failed to read upload field {}: {}", name, e);
            error_response(StatusCode::BAD_REQUEST, e.body_text())
        })?;

        if bytes.is_empty() {
            continue;
        }

        let stored = state
            .attachment_store()
            .save(NewAttachment {
                name,
                mime,
                bytes: bytes.to_vec(),
            })
            .await
            .map_err(|e| {
                tracing::error!("Failed to store upload: {}", e);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            })?;

        tracing::info!("Stored upload {} as {} ({} bytes)", stored.name, stored.id, stored.size);
        files.push(stored);
    }

    Ok(Json(UploadResponse { files }))
}

pub fn router(body_limit: usize) -> Router<AppState> {
    Router::new().route(
        "/upload",
        post(upload_files).layer(DefaultBodyLimit::max(body_limit)),
    )
}
