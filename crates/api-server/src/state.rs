//! Application state

use std::path::PathBuf;
use std::sync::Arc;

use assistant_runner::{AssistantsClient, ServiceConfig, TurnOrchestrator};
use relay_core::attachment::FileAttachmentStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    client: Arc<AssistantsClient>,
    orchestrator: TurnOrchestrator,
    attachment_store: Arc<FileAttachmentStore>,
}

impl AppState {
    /// Create a new AppState, creating the uploads directory if needed
    pub async fn new(config: &ServiceConfig, uploads_dir: PathBuf) -> relay_core::Result<Self> {
        let attachment_store = Arc::new(FileAttachmentStore::new(uploads_dir).await?);
        let client = Arc::new(AssistantsClient::new(config));
        let orchestrator = TurnOrchestrator::new(config, client.clone(), attachment_store.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                client,
                orchestrator,
                attachment_store,
            }),
        })
    }

    /// Client for direct remote calls
    pub fn client(&self) -> &AssistantsClient {
        &self.inner.client
    }

    pub fn orchestrator(&self) -> &TurnOrchestrator {
        &self.inner.orchestrator
    }

    pub fn attachment_store(&self) -> &FileAttachmentStore {
        &self.inner.attachment_store
    }
}
