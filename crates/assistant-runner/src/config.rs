//! Configuration for the remote assistant service and the turn pipeline

use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// How attachments reach the assistant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachmentMode {
    /// Text is injected as synthetic user messages
    #[default]
    Inline,
    /// Blobs are registered as remote files and referenced from the last user message
    Uploaded,
}

impl FromStr for AttachmentMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(AttachmentMode::Inline),
            "uploaded" | "upload" | "file" => Ok(AttachmentMode::Uploaded),
            other => Err(format!("Unknown attachment mode: {}", other)),
        }
    }
}

/// Run polling budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(300),
            max_attempts: 100,
        }
    }
}

/// Settings for talking to the remote assistant service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bearer token; `None` leaves the service unconfigured
    pub api_key: Option<String>,
    /// API root, without a trailing slash
    pub base_url: String,
    /// Model for single-shot completions
    pub model: String,
    pub attachment_mode: AttachmentMode,
    pub poll: PollConfig,
    /// Deadline for one whole chat turn
    pub request_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            attachment_mode: AttachmentMode::default(),
            poll: PollConfig::default(),
            request_timeout: Duration::from_secs(45),
        }
    }
}

impl ServiceConfig {
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_attachment_mode(mut self, mode: AttachmentMode) -> Self {
        self.attachment_mode = mode;
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
