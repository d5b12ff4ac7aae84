//! Reply extraction from a completed conversation

use std::sync::Arc;

use tracing::info;

use relay_core::conversation::{ConversationEntry, MessageRole, Reply};

use crate::error::Result;
use crate::service::ConversationService;

pub struct ReplyExtractor {
    service: Arc<dyn ConversationService>,
}

impl ReplyExtractor {
    pub fn new(service: Arc<dyn ConversationService>) -> Self {
        Self { service }
    }

    /// Read the context back and pick the latest assistant reply
    pub async fn extract(&self, context_id: &str) -> Result<Reply> {
        let entries = self.service.list_entries(context_id).await?;
        let reply = Self::select(&entries);

        let preview: String = reply.reply.chars().take(100).collect();
        info!("Retrieved assistant response: thread={}, reply={}", context_id, preview);

        Ok(reply)
    }

    /// Latest assistant entry by creation time, later position breaking
    /// ties. No entry, or an empty one, yields the fallback reply.
    pub fn select(entries: &[ConversationEntry]) -> Reply {
        entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.role == MessageRole::Assistant)
            .max_by_key(|(index, entry)| (entry.created_at, *index))
            .map(|(_, entry)| entry.text.as_str())
            .filter(|text| !text.is_empty())
            .map(Reply::new)
            .unwrap_or_else(Reply::fallback)
    }
}
