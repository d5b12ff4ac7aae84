//! In-memory conversation service and sleeper for tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use relay_core::conversation::{ConversationEntry, MessageRole, OutboundMessage};

use crate::error::{RelayError, Result};
use crate::poller::Sleeper;
use crate::service::{ConversationService, FileUpload, RunHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateContext,
    RegisterFile(String),
    AppendMessage(String),
    StartRun(String),
    RunStatus,
    ListEntries,
}

#[derive(Default)]
struct Recorded {
    calls: Vec<Call>,
    appended: Vec<OutboundMessage>,
    uploads: Vec<FileUpload>,
}

pub struct FakeService {
    configured: bool,
    fail_create: bool,
    fail_start: bool,
    fail_list: bool,
    fail_append_containing: Option<String>,
    fail_register: Option<String>,
    initial_status: String,
    /// Scripted poll answers; `None` is a failed status request
    statuses: Mutex<VecDeque<Option<String>>>,
    steady_status: String,
    reply: Option<String>,
    entries: Option<Vec<ConversationEntry>>,
    contexts: AtomicU32,
    recorded: Mutex<Recorded>,
}

impl FakeService {
    pub fn new() -> Self {
        Self {
            configured: true,
            fail_create: false,
            fail_start: false,
            fail_list: false,
            fail_append_containing: None,
            fail_register: None,
            initial_status: "queued".to_string(),
            statuses: Mutex::new(VecDeque::new()),
            steady_status: "completed".to_string(),
            reply: None,
            entries: None,
            contexts: AtomicU32::new(0),
            recorded: Mutex::default(),
        }
    }

    pub fn unconfigured(mut self) -> Self {
        self.configured = false;
        self
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = Some(reply.to_string());
        self
    }

    pub fn with_entries(mut self, entries: Vec<ConversationEntry>) -> Self {
        self.entries = Some(entries);
        self
    }

    pub fn with_initial_status(mut self, status: &str) -> Self {
        self.initial_status = status.to_string();
        self
    }

    pub fn with_statuses(self, statuses: &[Option<&str>]) -> Self {
        *self.statuses.lock().unwrap() = statuses.iter().map(|s| s.map(str::to_string)).collect();
        self
    }

    pub fn with_steady_status(mut self, status: &str) -> Self {
        self.steady_status = status.to_string();
        self
    }

    pub fn fail_create(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn fail_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn fail_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    pub fn fail_append_containing(mut self, needle: &str) -> Self {
        self.fail_append_containing = Some(needle.to_string());
        self
    }

    pub fn fail_register(mut self, name: &str) -> Self {
        self.fail_register = Some(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.recorded.lock().unwrap().calls.clone()
    }

    pub fn appended(&self) -> Vec<OutboundMessage> {
        self.recorded.lock().unwrap().appended.clone()
    }

    pub fn uploads(&self) -> Vec<FileUpload> {
        self.recorded.lock().unwrap().uploads.clone()
    }

    fn record(&self, call: Call) {
        self.recorded.lock().unwrap().calls.push(call);
    }

    fn failure(operation: &str) -> RelayError {
        RelayError::remote(operation, 500, "upstream exploded")
    }
}

#[async_trait]
impl ConversationService for FakeService {
    fn ensure_configured(&self) -> Result<()> {
        if self.configured {
            Ok(())
        } else {
            Err(RelayError::MissingCredentials)
        }
    }

    async fn create_context(&self) -> Result<String> {
        self.record(Call::CreateContext);
        if self.fail_create {
            return Err(Self::failure("Failed to create thread"));
        }
        let n = self.contexts.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("thread_{}", n))
    }

    async fn register_file(&self, upload: FileUpload) -> Result<String> {
        self.record(Call::RegisterFile(upload.name.clone()));
        if self.fail_register.as_deref() == Some(upload.name.as_str()) {
            return Err(Self::failure("Failed to upload file"));
        }
        let id = format!("file-{}", upload.name);
        self.recorded.lock().unwrap().uploads.push(upload);
        Ok(id)
    }

    async fn append_message(&self, context_id: &str, message: &OutboundMessage) -> Result<()> {
        self.record(Call::AppendMessage(context_id.to_string()));
        if let Some(needle) = &self.fail_append_containing {
            if message.content.contains(needle.as_str()) {
                return Err(Self::failure("Failed to add message"));
            }
        }
        self.recorded.lock().unwrap().appended.push(message.clone());
        Ok(())
    }

    async fn start_run(&self, _context_id: &str, assistant_id: &str) -> Result<RunHandle> {
        self.record(Call::StartRun(assistant_id.to_string()));
        if self.fail_start {
            return Err(Self::failure("Failed to run assistant"));
        }
        Ok(RunHandle {
            id: "run_1".to_string(),
            status: self.initial_status.clone(),
        })
    }

    async fn run_status(&self, _context_id: &str, _run_id: &str) -> Result<String> {
        self.record(Call::RunStatus);
        match self.statuses.lock().unwrap().pop_front() {
            Some(Some(status)) => Ok(status),
            Some(None) => Err(Self::failure("Failed to check run status")),
            None => Ok(self.steady_status.clone()),
        }
    }

    async fn list_entries(&self, _context_id: &str) -> Result<Vec<ConversationEntry>> {
        self.record(Call::ListEntries);
        if self.fail_list {
            return Err(Self::failure("Failed to retrieve response"));
        }
        if let Some(entries) = &self.entries {
            return Ok(entries.clone());
        }

        let appended = self.recorded.lock().unwrap().appended.clone();
        let mut entries: Vec<ConversationEntry> = appended
            .into_iter()
            .enumerate()
            .map(|(i, message)| ConversationEntry {
                id: format!("msg_{}", i),
                role: message.role,
                text: message.content,
                created_at: i as i64,
            })
            .collect();
        if let Some(reply) = &self.reply {
            entries.push(ConversationEntry {
                id: "msg_reply".to_string(),
                role: MessageRole::Assistant,
                text: reply.clone(),
                created_at: entries.len() as i64,
            });
        }
        Ok(entries)
    }
}

/// Sleeper that returns at once and remembers what it was asked to wait
#[derive(Default)]
pub struct InstantSleeper {
    slept: Mutex<Vec<Duration>>,
}

impl InstantSleeper {
    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
    }
}
