//! Startup configuration
//!
//! The environment is read here, once, and turned into plain structs that
//! are handed to the rest of the server.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use assistant_runner::{AttachmentMode, PollConfig, ServiceConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `*` allows any origin
    pub allowed_origin: String,
    pub uploads_dir: PathBuf,
    /// Extra prefix every route is also served under, e.g. `/widget`
    pub base_path: Option<String>,
    pub json_body_limit: usize,
    pub upload_body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8787,
            allowed_origin: "*".to_string(),
            uploads_dir: PathBuf::from("server").join("uploads"),
            base_path: None,
            json_body_limit: 1024 * 1024,
            upload_body_limit: 25 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_string("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT", defaults.port),
            allowed_origin: env_string("ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin),
            uploads_dir: env_string("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_dir),
            base_path: env_string("BASE_PATH").and_then(|p| normalize_base_path(&p)),
            json_body_limit: defaults.json_body_limit,
            upload_body_limit: env_parse("UPLOAD_BODY_LIMIT", defaults.upload_body_limit),
        }
    }
}

/// Remote service settings
pub fn service_config_from_env() -> ServiceConfig {
    let defaults = ServiceConfig::default();
    let poll = PollConfig {
        interval: Duration::from_millis(env_parse(
            "RUN_POLL_INTERVAL_MS",
            defaults.poll.interval.as_millis() as u64,
        )),
        max_attempts: env_parse("RUN_POLL_MAX_ATTEMPTS", defaults.poll.max_attempts),
    };

    ServiceConfig {
        api_key: env_string("OPENAI_API_KEY"),
        base_url: env_string("OPENAI_BASE_URL")
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string(),
        model: env_string("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        attachment_mode: env_string("ATTACHMENT_MODE")
            .and_then(|raw| match raw.parse::<AttachmentMode>() {
                Ok(mode) => Some(mode),
                Err(e) => {
                    tracing::warn!("{}, using inline", e);
                    None
                }
            })
            .unwrap_or_default(),
        poll,
        request_timeout: Duration::from_secs(env_parse(
            "REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        )),
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn env_parse<T: FromStr>(name: &str, default: T) -> T {
    env_string(name)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

/// `/widget/` and `widget` both become `/widget`; `/` means no prefix
pub fn normalize_base_path(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("/{}", trimmed))
    }
}
