//! Assistant Runner - turns one chat turn into a remote assistant run
//!
//! This crate creates a conversation context on the remote assistant
//! service, injects attachments and history, runs the chosen assistant
//! under a bounded polling budget and extracts its reply.

mod builder;
mod client;
mod config;
mod error;
mod extractor;
mod orchestrator;
mod poller;
mod resolver;
mod service;

#[cfg(test)]
mod fake;

pub use builder::{BuiltConversation, ConversationBuilder};
pub use client::{extract_output_text, AssistantSummary, AssistantsClient};
pub use config::{AttachmentMode, PollConfig, ServiceConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use error::{RelayError, Result};
pub use extractor::ReplyExtractor;
pub use orchestrator::{TurnOrchestrator, TurnRequest};
pub use poller::{BoundedPoll, PollOutcome, RunPoller, RunReport, Sleeper, TokioSleeper};
pub use resolver::{
    inline_text, resolver_for, AttachmentResolver, InlineResolver, UploadResolver, BINARY_BASE64_LIMIT,
    BINARY_MARKER, INLINE_TEXT_LIMIT,
};
pub use service::{ConversationService, FileUpload, RunHandle, FILE_PURPOSE};
