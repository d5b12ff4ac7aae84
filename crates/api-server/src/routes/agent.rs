//! Single-shot agent endpoint
//!
//! Sends the whole message list to the responses endpoint in one call,
//! without a conversation context or run.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::Value;

use assistant_runner::RelayError;
use relay_core::conversation::{ChatMessage, Reply};

use super::{json_body, relay_error_response, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AgentRequest {
    #[serde(default)]
    pub messages: Value,
}

/// POST /agent - One-shot completion
async fn complete(
    State(state): State<AppState>,
    body: Result<Json<AgentRequest>, JsonRejection>,
) -> Result<Json<Reply>, ApiError> {
    let req = json_body(body)?;
    let messages = ChatMessage::parse_history(&req.messages)
        .map_err(|e| relay_error_response(RelayError::invalid_input(invalid_message(e))))?;

    let reply = state
        .client()
        .create_response(&messages)
        .await
        .map_err(|e| {
            tracing::error!("Agent request failed: {}", e);
            relay_error_response(e)
        })?;

    Ok(Json(reply))
}

fn invalid_message(e: relay_core::Error) -> String {
    match e {
        relay_core::Error::InvalidInput(message) => message,
        other => other.to_string(),
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/agent", post(complete))
}
