//! Run polling
//!
//! A run is started against a finished conversation context and its status
//! is checked on a fixed interval until it leaves the waiting states or the
//! attempt budget runs out.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use relay_core::conversation::RunState;

use crate::config::PollConfig;
use crate::error::Result;
use crate::service::ConversationService;

/// Suspends between poll attempts
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Result of a bounded poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T> {
    /// The value stopped being pending
    Settled { value: T, attempts: u32 },
    /// Still pending after every attempt was used
    Exhausted { last: T, attempts: u32 },
}

/// Max attempts times a fixed interval
#[derive(Debug, Clone, Copy)]
pub struct BoundedPoll {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl From<PollConfig> for BoundedPoll {
    fn from(config: PollConfig) -> Self {
        Self {
            interval: config.interval,
            max_attempts: config.max_attempts,
        }
    }
}

impl BoundedPoll {
    /// Re-check `initial` until `is_pending` is false.
    ///
    /// Each attempt sleeps one interval, then calls `check`. A failed check
    /// counts as a used attempt and keeps the previous value.
    pub async fn run<T, E, F, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        initial: T,
        is_pending: impl Fn(&T) -> bool,
        mut check: F,
    ) -> PollOutcome<T>
    where
        E: Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let mut current = initial;
        let mut attempts = 0;

        while is_pending(&current) {
            if attempts >= self.max_attempts {
                return PollOutcome::Exhausted {
                    last: current,
                    attempts,
                };
            }

            sleeper.sleep(self.interval).await;

            match check().await {
                Ok(next) => current = next,
                Err(e) => warn!("Poll attempt {} failed, will retry: {}", attempts + 1, e),
            }
            attempts += 1;
        }

        PollOutcome::Settled {
            value: current,
            attempts,
        }
    }
}

/// Terminal outcome of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: String,
    /// Always terminal
    pub state: RunState,
    /// Last status string reported by the remote service
    pub remote_status: String,
    pub attempts: u32,
}

/// Starts runs and waits for them under a bounded budget
pub struct RunPoller {
    service: Arc<dyn ConversationService>,
    poll: BoundedPoll,
    sleeper: Arc<dyn Sleeper>,
}

impl RunPoller {
    pub fn new(service: Arc<dyn ConversationService>, poll: BoundedPoll, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            service,
            poll,
            sleeper,
        }
    }

    /// Start `assistant_id` on `context_id` and poll until terminal.
    ///
    /// Failing to start is an error; everything after that ends in a
    /// report.
    pub async fn run(&self, context_id: &str, assistant_id: &str) -> Result<RunReport> {
        let run = self.service.start_run(context_id, assistant_id).await?;
        info!("Started assistant run: run={}, thread={}", run.id, context_id);

        let run_id = run.id.clone();
        let service = Arc::clone(&self.service);
        let outcome = self
            .poll
            .run(
                self.sleeper.as_ref(),
                run.status,
                |status| !RunState::from_remote(status).is_terminal(),
                || {
                    let service = Arc::clone(&service);
                    let run_id = run_id.clone();
                    async move {
                        let status = service.run_status(context_id, &run_id).await?;
                        debug!("Run status: run={}, status={}", run_id, status);
                        Ok::<_, crate::error::RelayError>(status)
                    }
                },
            )
            .await;

        let report = match outcome {
            PollOutcome::Settled { value, attempts } => RunReport {
                run_id: run.id,
                state: RunState::from_remote(&value),
                remote_status: value,
                attempts,
            },
            PollOutcome::Exhausted { last, attempts } => {
                warn!("Assistant run timed out: run={}, thread={}", run.id, context_id);
                RunReport {
                    run_id: run.id,
                    state: RunState::TimedOut,
                    remote_status: last,
                    attempts,
                }
            }
        };

        Ok(report)
    }
}
