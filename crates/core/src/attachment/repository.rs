//! Attachment repository trait
//!
//! Defines the interface for blob storage operations.

use async_trait::async_trait;

use super::model::{NewAttachment, StoredAttachment};
use crate::Result;

/// Repository interface for uploaded attachment blobs
#[async_trait]
pub trait AttachmentRepository: Send + Sync {
    /// Store a blob under a fresh identifier
    async fn save(&self, attachment: NewAttachment) -> Result<StoredAttachment>;

    /// Read a blob back; `None` when no blob exists for the identifier
    async fn load(&self, id: &str) -> Result<Option<Vec<u8>>>;
}
