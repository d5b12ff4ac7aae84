//! Attachment content resolution
//!
//! Two strategies turn a stored blob into conversation content: inline
//! text injection, or registration as a remote file object. One is chosen
//! per deployment through [`AttachmentMode`].

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use tracing::{debug, warn};

use relay_core::attachment::{Attachment, ResolvedAttachmentContent};

use crate::config::AttachmentMode;
use crate::service::{ConversationService, FileUpload, FILE_PURPOSE};

/// Max characters of text inlined per attachment
pub const INLINE_TEXT_LIMIT: usize = 50_000;

/// Max base64 characters inlined for a binary attachment
pub const BINARY_BASE64_LIMIT: usize = 30_000;

/// Prefix marking inlined base64
pub const BINARY_MARKER: &str = "[Binary file - base64 encoded]\n\n";

/// Turns one attachment and its bytes into conversation content.
///
/// `None` means the attachment is skipped; resolution is best-effort and
/// never fails a turn.
#[async_trait]
pub trait AttachmentResolver: Send + Sync {
    async fn resolve(&self, attachment: &Attachment, bytes: Vec<u8>) -> Option<ResolvedAttachmentContent>;
}

/// Pick the resolver for a deployment's attachment mode
pub fn resolver_for(
    mode: AttachmentMode,
    service: Arc<dyn ConversationService>,
) -> Arc<dyn AttachmentResolver> {
    match mode {
        AttachmentMode::Inline => Arc::new(InlineResolver),
        AttachmentMode::Uploaded => Arc::new(UploadResolver::new(service)),
    }
}

/// Inlines attachment text, or bounded base64 for binary blobs
pub struct InlineResolver;

#[async_trait]
impl AttachmentResolver for InlineResolver {
    async fn resolve(&self, attachment: &Attachment, bytes: Vec<u8>) -> Option<ResolvedAttachmentContent> {
        let name = attachment.display_name();
        debug!("Inlining attachment {} ({} bytes)", name, bytes.len());

        Some(ResolvedAttachmentContent::Inline {
            name,
            text: inline_text(&bytes),
        })
    }
}

/// Registers each attachment as a remote file
pub struct UploadResolver {
    service: Arc<dyn ConversationService>,
}

impl UploadResolver {
    pub fn new(service: Arc<dyn ConversationService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl AttachmentResolver for UploadResolver {
    async fn resolve(&self, attachment: &Attachment, bytes: Vec<u8>) -> Option<ResolvedAttachmentContent> {
        let name = attachment.display_name();
        let upload = FileUpload {
            name: name.clone(),
            mime: attachment.mime_hint.clone(),
            bytes,
            purpose: FILE_PURPOSE.to_string(),
        };

        match self.service.register_file(upload).await {
            Ok(remote_file_id) => Some(ResolvedAttachmentContent::Uploaded {
                name,
                remote_file_id,
            }),
            Err(e) => {
                warn!("Failed to register attachment {}: {}", name, e);
                None
            }
        }
    }
}

/// Text to inline for a blob.
///
/// Bytes are decoded as UTF-8 (lossily). When more than a tenth of the
/// decoded characters are control characters other than tab, newline and
/// carriage return the blob is treated as binary and inlined as marked,
/// truncated base64 instead.
pub fn inline_text(bytes: &[u8]) -> String {
    let decoded = String::from_utf8_lossy(bytes);

    let text = if looks_binary(&decoded) {
        // Every 3 input bytes become 4 base64 characters
        let prefix = &bytes[..bytes.len().min(BINARY_BASE64_LIMIT / 4 * 3)];
        let encoded = base64::engine::general_purpose::STANDARD.encode(prefix);
        format!("{}{}", BINARY_MARKER, truncate_chars(&encoded, BINARY_BASE64_LIMIT))
    } else {
        decoded.into_owned()
    };

    truncate_chars(&text, INLINE_TEXT_LIMIT).to_string()
}

fn looks_binary(text: &str) -> bool {
    let mut total = 0usize;
    let mut control = 0usize;
    for c in text.chars() {
        total += 1;
        if c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r' | '\x7f') {
            control += 1;
        }
    }
    control * 10 > total
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
