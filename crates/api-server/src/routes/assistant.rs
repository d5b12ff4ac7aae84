//! Assistant chat endpoint
//!
//! Runs one chat turn against a pre-configured remote assistant.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::Value;

use assistant_runner::TurnRequest;
use relay_core::conversation::Reply;

use super::{error_response, json_body, relay_error_response, ApiError};
use crate::state::AppState;

/// POST /assistant - Submit a chat turn
async fn submit_turn(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Reply>, ApiError> {
    let body = json_body(body)?;
    let request: TurnRequest = serde_json::from_value(body).map_err(|e| {
        error_response(StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e))
    })?;

    tracing::info!(
        "Assistant proxy received request: assistant_id={:?}, attachments={}",
        request.assistant_id,
        request.attachments.as_ref().map(Vec::len).unwrap_or_default()
    );

    let reply = state
        .orchestrator()
        .submit_turn(request)
        .await
        .map_err(|e| {
            tracing::error!("Assistant proxy error: {}", e);
            relay_error_response(e)
        })?;

    Ok(Json(reply))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/assistant", post(submit_turn))
}
