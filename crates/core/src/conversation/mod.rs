//! Conversation module
//!
//! Messages exchanged with the caller, entries read back from the remote
//! conversation context, and the lifecycle of a processing run.

mod model;

pub use model::{
    ChatMessage, ConversationEntry, IncomingMessage, MessageRole, OutboundMessage, Reply,
    RunState, FALLBACK_REPLY,
};
