//! Assistant discovery endpoint
//!
//! Lets the frontend list assistants without baking ids into its build.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use assistant_runner::AssistantSummary;

use super::{relay_error_response, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AssistantListResponse {
    pub assistants: Vec<AssistantSummary>,
}

/// GET /assistants - List remote assistants
async fn list_assistants(State(state): State<AppState>) -> Result<Json<AssistantListResponse>, ApiError> {
    let assistants = state
        .client()
        .list_assistants()
        .await
        .map_err(relay_error_response)?;

    Ok(Json(AssistantListResponse { assistants }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/assistants", get(list_assistants))
}
