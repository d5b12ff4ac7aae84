use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Reply returned when a completed conversation has no assistant text.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't generate a reply.";

/// Message role in a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// A canonical chat message supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Validate a raw `messages` value from a request body.
    ///
    /// The value must be an array; each element is either a bare string
    /// (a user message) or a `{role, content}` object.
    pub fn parse_history(value: &Value) -> Result<Vec<ChatMessage>> {
        let items = value
            .as_array()
            .ok_or_else(|| Error::InvalidInput("messages must be an array".into()))?;

        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value::<IncomingMessage>(item.clone())
                    .map(ChatMessage::from)
                    .map_err(|e| {
                        Error::InvalidInput(format!("messages[{}] is not a valid message: {}", index, e))
                    })
            })
            .collect()
    }
}

/// Message shape accepted at the HTTP boundary
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum IncomingMessage {
    Text(String),
    Structured { role: MessageRole, content: String },
}

impl From<IncomingMessage> for ChatMessage {
    fn from(message: IncomingMessage) -> Self {
        match message {
            IncomingMessage::Text(content) => ChatMessage::user(content),
            IncomingMessage::Structured { role, content } => ChatMessage { role, content },
        }
    }
}

/// A message as it is appended to the remote conversation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub role: MessageRole,
    pub content: String,
    /// Remote file ids made available to content search on this message
    pub file_ids: Vec<String>,
}

impl OutboundMessage {
    pub fn plain(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
            file_ids: Vec::new(),
        }
    }
}

/// An entry read back from the remote conversation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub id: String,
    pub role: MessageRole,
    pub text: String,
    /// Unix seconds
    pub created_at: i64,
}

/// State of a processing run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Queued,
    InProgress,
    Completed,
    Failed,
    TimedOut,
}

impl RunState {
    /// Map a remote run status onto a run state.
    ///
    /// Anything other than the two waiting states and `completed` ends the
    /// run as failed.
    pub fn from_remote(status: &str) -> Self {
        match status {
            "queued" => RunState::Queued,
            "in_progress" => RunState::InProgress,
            "completed" => RunState::Completed,
            _ => RunState::Failed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunState::Queued | RunState::InProgress)
    }
}

/// Final text handed back to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub reply: String,
}

impl Reply {
    pub fn new(text: impl Into<String>) -> Self {
        Self { reply: text.into() }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_REPLY)
    }

    pub fn is_fallback(&self) -> bool {
        self.reply == FALLBACK_REPLY
    }
}
