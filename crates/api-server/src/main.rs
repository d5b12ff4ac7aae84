//! API Server for the assistant relay
//!
//! Serves the chat widget's backend: assistant turns, file uploads,
//! assistant discovery and single-shot completions.

mod config;
mod routes;
mod state;

#[cfg(test)]
mod test_support;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "api_server=debug,assistant_runner=debug,relay_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let server_config = ServerConfig::from_env();
    let service_config = config::service_config_from_env();

    if service_config.api_key.is_none() {
        tracing::warn!("OPENAI_API_KEY is not set; assistant endpoints will answer 500");
    }
    tracing::info!(
        "Attachment mode: {:?}, poll: {:?} x {}, request timeout: {:?}",
        service_config.attachment_mode,
        service_config.poll.interval,
        service_config.poll.max_attempts,
        service_config.request_timeout
    );
    tracing::info!("Using uploads directory: {:?}", server_config.uploads_dir);

    let app_state = AppState::new(&service_config, server_config.uploads_dir.clone())
        .await
        .context("Failed to initialize application state")?;

    let app = routes::build_router(app_state, &server_config);

    let addr = format!("{}:{}", server_config.host, server_config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Agent proxy listening on http://{}", listener.local_addr()?);
    if let Some(base_path) = &server_config.base_path {
        tracing::info!("Routes also served under {}", base_path);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
