//! Error types for assistant-runner

use std::time::Duration;

use thiserror::Error;

/// Result type alias for orchestration operations
pub type Result<T> = std::result::Result<T, RelayError>;

/// Errors that can end a chat turn
#[derive(Debug, Error)]
pub enum RelayError {
    /// The caller sent something unusable
    #[error("{message}")]
    InvalidInput { message: String },

    /// No API key was configured
    #[error("OPENAI_API_KEY is not configured")]
    MissingCredentials,

    /// A remote call failed or answered with a non-success status
    #[error("{operation}")]
    Remote {
        operation: String,
        status: Option<u16>,
        details: String,
    },

    /// The run reached a terminal state other than `completed`
    #[error("Assistant run failed with status: {status}")]
    RunFailed { status: String },

    /// The run was still waiting when the poll budget ran out
    #[error("Assistant response timed out")]
    RunTimedOut { attempts: u32 },

    /// The whole turn exceeded its deadline
    #[error("Request timed out after {}", describe_timeout(.timeout))]
    DeadlineExceeded { timeout: Duration },

    /// Attachment store failure
    #[error("Attachment store error: {0}")]
    Store(#[from] relay_core::Error),
}

fn describe_timeout(timeout: &Duration) -> String {
    let millis = timeout.as_millis();
    if millis % 1000 == 0 {
        format!("{} seconds", timeout.as_secs())
    } else {
        format!("{} ms", millis)
    }
}

impl RelayError {
    /// Create an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a Remote error from a non-success response
    pub fn remote(operation: impl Into<String>, status: u16, details: impl Into<String>) -> Self {
        Self::Remote {
            operation: operation.into(),
            status: Some(status),
            details: details.into(),
        }
    }

    /// Create a Remote error for a request that never got a response
    pub fn transport(operation: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Remote {
            operation: operation.into(),
            status: None,
            details: source.to_string(),
        }
    }

    /// Remote error body, when there is one
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Remote { details, .. } if !details.is_empty() => Some(details),
            _ => None,
        }
    }
}
