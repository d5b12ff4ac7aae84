//! Remote conversation service seam
//!
//! Every network step of a chat turn goes through this trait so the
//! pipeline can run against the real API or an in-memory double.

use async_trait::async_trait;
use relay_core::conversation::{ConversationEntry, OutboundMessage};

use crate::error::Result;

/// Purpose tag for files registered for assistant use
pub const FILE_PURPOSE: &str = "assistants";

/// A run as reported when it is started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub id: String,
    /// Raw remote status, e.g. `queued`
    pub status: String,
}

/// A file to register with the remote service
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
    pub purpose: String,
}

#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Fail fast, before any network call, when credentials are missing
    fn ensure_configured(&self) -> Result<()> {
        Ok(())
    }

    /// Create a new conversation context and return its id
    async fn create_context(&self) -> Result<String>;

    /// Register a file and return the remote file id
    async fn register_file(&self, upload: FileUpload) -> Result<String>;

    /// Append one message to a context
    async fn append_message(&self, context_id: &str, message: &OutboundMessage) -> Result<()>;

    /// Start a run of `assistant_id` against a context
    async fn start_run(&self, context_id: &str, assistant_id: &str) -> Result<RunHandle>;

    /// Current raw status of a run
    async fn run_status(&self, context_id: &str, run_id: &str) -> Result<String>;

    /// All entries of a context, oldest first
    async fn list_entries(&self, context_id: &str) -> Result<Vec<ConversationEntry>>;
}
