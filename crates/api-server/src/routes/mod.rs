//! Route handlers

pub mod agent;
pub mod assistant;
pub mod assistants;
pub mod health;
pub mod upload;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit},
    http::{HeaderValue, StatusCode},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use assistant_runner::RelayError;

use crate::config::ServerConfig;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            details: None,
        }),
    )
}

/// Unwrap a JSON body, answering a rejected one with a JSON 400
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            tracing::warn!("Rejected request body: {}", rejection.body_text());
            Err(error_response(StatusCode::BAD_REQUEST, rejection.body_text()))
        }
    }
}

/// Map an orchestration error onto a status code and JSON body
pub fn relay_error_response(e: RelayError) -> ApiError {
    let status = match &e {
        RelayError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        RelayError::RunTimedOut { .. } | RelayError::DeadlineExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
        RelayError::MissingCredentials
        | RelayError::Remote { .. }
        | RelayError::RunFailed { .. }
        | RelayError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
            details: e.details().map(str::to_string),
        }),
    )
}

fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(assistant::router())
        .merge(assistants::router())
        .merge(agent::router())
        .layer(DefaultBodyLimit::max(config.json_body_limit))
        .merge(upload::router(config.upload_body_limit))
}

fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let origin = if allowed_origin == "*" {
        AllowOrigin::any()
    } else {
        match HeaderValue::from_str(allowed_origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                tracing::warn!("Invalid ALLOWED_ORIGIN {:?} ({}), allowing any origin", allowed_origin, e);
                AllowOrigin::any()
            }
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Full application router, mounted at the root and under the base path
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let api = api_routes(config);

    let mut router = Router::new().merge(api.clone());
    if let Some(base_path) = &config.base_path {
        router = router.nest(base_path, api);
    }

    router
        .layer(cors_layer(&config.allowed_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
