use serde::{Deserialize, Serialize};

/// Reference to a stored blob, as sent back by the caller with a chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "mime", skip_serializing_if = "Option::is_none")]
    pub mime_hint: Option<String>,
}

impl Attachment {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_hint: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime_hint = Some(mime.into());
        self
    }

    /// Name shown to the assistant; falls back to `file-<id>`.
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("file-{}", self.id)
        } else {
            self.name.clone()
        }
    }
}

/// A blob about to be written to the store
#[derive(Debug, Clone)]
pub struct NewAttachment {
    pub name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

/// Metadata for a blob written to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAttachment {
    pub id: String,
    pub name: String,
    pub mime: Option<String>,
    pub size: u64,
}

impl From<StoredAttachment> for Attachment {
    fn from(stored: StoredAttachment) -> Self {
        Self {
            id: stored.id,
            name: stored.name,
            mime_hint: stored.mime,
        }
    }
}

/// How one attachment ends up in the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAttachmentContent {
    /// Text inlined as a synthetic user message
    Inline { name: String, text: String },
    /// File registered with the remote service
    Uploaded { name: String, remote_file_id: String },
}

impl ResolvedAttachmentContent {
    pub fn name(&self) -> &str {
        match self {
            ResolvedAttachmentContent::Inline { name, .. } => name,
            ResolvedAttachmentContent::Uploaded { name, .. } => name,
        }
    }
}
