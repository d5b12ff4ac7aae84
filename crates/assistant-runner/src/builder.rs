//! Conversation assembly
//!
//! Creates the remote context for one turn, resolves attachments and
//! appends them together with the caller's history. The context is final
//! when `build` returns.

use std::sync::Arc;

use tracing::{debug, info, warn};

use relay_core::attachment::{Attachment, AttachmentRepository, ResolvedAttachmentContent};
use relay_core::conversation::{ChatMessage, MessageRole, OutboundMessage};

use crate::error::Result;
use crate::resolver::AttachmentResolver;
use crate::service::ConversationService;

/// A context ready to be run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltConversation {
    pub context_id: String,
    /// Synthetic attachment messages that were appended
    pub inlined_attachments: usize,
    /// Remote file references attached to the last user message
    pub attached_files: usize,
    pub history_len: usize,
}

pub struct ConversationBuilder {
    service: Arc<dyn ConversationService>,
    store: Arc<dyn AttachmentRepository>,
    resolver: Arc<dyn AttachmentResolver>,
}

impl ConversationBuilder {
    pub fn new(
        service: Arc<dyn ConversationService>,
        store: Arc<dyn AttachmentRepository>,
        resolver: Arc<dyn AttachmentResolver>,
    ) -> Self {
        Self {
            service,
            store,
            resolver,
        }
    }

    /// Build the conversation for one turn.
    ///
    /// Context creation and history appends are fatal; anything to do with
    /// attachments is best-effort.
    pub async fn build(&self, history: &[ChatMessage], attachments: &[Attachment]) -> Result<BuiltConversation> {
        let context_id = self.service.create_context().await?;
        info!("Created thread: {}", context_id);

        let resolved = self.resolve_all(attachments).await;

        let mut inlined_attachments = 0;
        let mut file_ids = Vec::new();
        for content in resolved {
            match content {
                ResolvedAttachmentContent::Inline { name, text } => {
                    let message = OutboundMessage {
                        role: MessageRole::User,
                        content: format!("Here is the content of \"{}\" for your review:\n\n{}", name, text),
                        file_ids: Vec::new(),
                    };
                    match self.service.append_message(&context_id, &message).await {
                        Ok(()) => inlined_attachments += 1,
                        Err(e) => warn!("Failed to add attachment content message {}: {}", name, e),
                    }
                }
                ResolvedAttachmentContent::Uploaded { remote_file_id, .. } => file_ids.push(remote_file_id),
            }
        }

        let last_user = history.iter().rposition(|m| m.role == MessageRole::User);
        if !file_ids.is_empty() && last_user.is_none() {
            warn!(
                "Dropping {} file reference(s): no user message to attach them to",
                file_ids.len()
            );
        }

        let mut attached_files = 0;
        for (index, message) in history.iter().enumerate() {
            let mut outbound = OutboundMessage::plain(message);
            if Some(index) == last_user {
                attached_files = file_ids.len();
                outbound.file_ids = std::mem::take(&mut file_ids);
            }
            self.service.append_message(&context_id, &outbound).await?;
        }

        info!(
            "Added {} messages and {} attachments to thread {}",
            history.len(),
            inlined_attachments + attached_files,
            context_id
        );

        Ok(BuiltConversation {
            context_id,
            inlined_attachments,
            attached_files,
            history_len: history.len(),
        })
    }

    /// Resolve attachments in submission order, skipping any that cannot
    /// be loaded or resolved
    async fn resolve_all(&self, attachments: &[Attachment]) -> Vec<ResolvedAttachmentContent> {
        let mut resolved = Vec::with_capacity(attachments.len());

        for attachment in attachments {
            let bytes = match self.store.load(&attachment.id).await {
                Ok(Some(bytes)) => bytes,
                Ok(None) => {
                    debug!("Attachment {} not found in store, skipping", attachment.id);
                    continue;
                }
                Err(e) => {
                    warn!("Failed to read attachment {}: {}", attachment.id, e);
                    continue;
                }
            };

            let size = bytes.len();
            if let Some(content) = self.resolver.resolve(attachment, bytes).await {
                info!("Prepared attachment for review: name={}, size={}", content.name(), size);
                resolved.push(content);
            }
        }

        resolved
    }
}
