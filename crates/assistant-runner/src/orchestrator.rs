//! Turn orchestration
//!
//! One chat turn: validate, build the conversation, run it, read the reply.
//! Each step waits for the previous one; the first fatal failure ends the
//! turn.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, warn};

use relay_core::attachment::{Attachment, AttachmentRepository};
use relay_core::conversation::{ChatMessage, Reply, RunState};

use crate::builder::ConversationBuilder;
use crate::config::ServiceConfig;
use crate::error::{RelayError, Result};
use crate::extractor::ReplyExtractor;
use crate::poller::{BoundedPoll, RunPoller, Sleeper, TokioSleeper};
use crate::resolver::resolver_for;
use crate::service::ConversationService;

/// A chat turn as received from the client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TurnRequest {
    #[serde(default)]
    pub assistant_id: Option<String>,
    /// Left untyped so a non-array can be rejected with a clear message
    #[serde(default)]
    pub messages: Value,
    #[serde(default)]
    pub attachments: Option<Vec<Attachment>>,
}

struct ValidatedTurn {
    assistant_id: String,
    history: Vec<ChatMessage>,
    attachments: Vec<Attachment>,
}

pub struct TurnOrchestrator {
    service: Arc<dyn ConversationService>,
    builder: ConversationBuilder,
    poller: RunPoller,
    extractor: ReplyExtractor,
    request_timeout: Duration,
}

impl TurnOrchestrator {
    pub fn new(
        config: &ServiceConfig,
        service: Arc<dyn ConversationService>,
        store: Arc<dyn AttachmentRepository>,
    ) -> Self {
        Self::with_sleeper(config, service, store, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(
        config: &ServiceConfig,
        service: Arc<dyn ConversationService>,
        store: Arc<dyn AttachmentRepository>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let resolver = resolver_for(config.attachment_mode, Arc::clone(&service));

        Self {
            builder: ConversationBuilder::new(Arc::clone(&service), store, resolver),
            poller: RunPoller::new(Arc::clone(&service), BoundedPoll::from(config.poll), sleeper),
            extractor: ReplyExtractor::new(Arc::clone(&service)),
            service,
            request_timeout: config.request_timeout,
        }
    }

    /// Run one chat turn and return the assistant's reply.
    ///
    /// Input and credential problems are reported before any remote call.
    pub async fn submit_turn(&self, request: TurnRequest) -> Result<Reply> {
        let turn = Self::validate(request)?;
        self.service.ensure_configured()?;

        info!(
            "Assistant turn: assistant_id={}, messages={}, attachments={}",
            turn.assistant_id,
            turn.history.len(),
            turn.attachments.len()
        );

        match tokio::time::timeout(self.request_timeout, self.drive(&turn)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Assistant turn exceeded {:?}", self.request_timeout);
                Err(RelayError::DeadlineExceeded {
                    timeout: self.request_timeout,
                })
            }
        }
    }

    fn validate(request: TurnRequest) -> Result<ValidatedTurn> {
        let assistant_id = request
            .assistant_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| RelayError::invalid_input("assistant_id is required"))?;

        let history = ChatMessage::parse_history(&request.messages).map_err(|e| match e {
            relay_core::Error::InvalidInput(message) => RelayError::invalid_input(message),
            other => RelayError::Store(other),
        })?;

        Ok(ValidatedTurn {
            assistant_id,
            history,
            attachments: request.attachments.unwrap_or_default(),
        })
    }

    async fn drive(&self, turn: &ValidatedTurn) -> Result<Reply> {
        let conversation = self.builder.build(&turn.history, &turn.attachments).await?;
        let context_id = conversation.context_id.as_str();

        let report = self.poller.run(context_id, &turn.assistant_id).await?;
        match report.state {
            RunState::Completed => {}
            RunState::TimedOut => {
                return Err(RelayError::RunTimedOut {
                    attempts: report.attempts,
                })
            }
            _ => {
                error!("Assistant run failed: run={}, status={}", report.run_id, report.remote_status);
                return Err(RelayError::RunFailed {
                    status: report.remote_status,
                });
            }
        }

        self.extractor.extract(context_id).await
    }
}
