//! Mock remote assistant service and app builder for route tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;

use assistant_runner::{AttachmentMode, PollConfig, ServiceConfig};

use crate::config::ServerConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[derive(Default)]
struct UpstreamState {
    requests: usize,
    threads: u32,
    messages: HashMap<String, Vec<Value>>,
    files: Vec<RegisteredFile>,
    run_status: String,
    reply: Option<String>,
    fail_threads: bool,
}

type Shared = Arc<Mutex<UpstreamState>>;

/// A file received on `POST /files`
#[derive(Debug, Clone, Default)]
pub struct RegisteredFile {
    pub name: String,
    pub purpose: String,
    pub bytes: Vec<u8>,
}

/// Minimal stand-in for the remote assistants API
pub struct MockUpstream {
    pub base_url: String,
    state: Shared,
}

impl MockUpstream {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(UpstreamState {
            run_status: "completed".to_string(),
            reply: Some("Hi there".to_string()),
            ..Default::default()
        }));

        let router = Router::new()
            .route("/files", post(register_file))
            .route("/threads", post(create_thread))
            .route("/threads/{thread_id}/messages", post(add_message).get(list_messages))
            .route("/threads/{thread_id}/runs", post(start_run))
            .route("/threads/{thread_id}/runs/{run_id}", get(get_run))
            .route("/assistants", get(list_assistants))
            .route("/responses", post(create_response))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn set_run_status(&self, status: &str) {
        self.state.lock().unwrap().run_status = status.to_string();
    }

    pub fn fail_threads(&self) {
        self.state.lock().unwrap().fail_threads = true;
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests
    }

    /// Files registered so far, in order
    pub fn files(&self) -> Vec<RegisteredFile> {
        self.state.lock().unwrap().files.clone()
    }

    /// Message bodies appended to a thread, in order
    pub fn messages(&self, thread_id: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .messages
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }
}

async fn register_file(State(state): State<Shared>, mut multipart: Multipart) -> Json<Value> {
    let mut file = RegisteredFile::default();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("purpose") => file.purpose = field.text().await.unwrap(),
            Some("file") => {
                file.name = field.file_name().unwrap_or_default().to_string();
                file.bytes = field.bytes().await.unwrap().to_vec();
            }
            _ => {}
        }
    }

    let mut state = state.lock().unwrap();
    state.requests += 1;
    state.files.push(file);
    Json(json!({ "id": format!("file_{}", state.files.len()) }))
}

async fn create_thread(State(state): State<Shared>) -> Response {
    let mut state = state.lock().unwrap();
    state.requests += 1;
    if state.fail_threads {
        return (StatusCode::INTERNAL_SERVER_ERROR, "thread quota exceeded").into_response();
    }
    state.threads += 1;
    Json(json!({ "id": format!("thread_{}", state.threads) })).into_response()
}

async fn add_message(
    State(state): State<Shared>,
    Path(thread_id): Path<String>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut state = state.lock().unwrap();
    state.requests += 1;
    state.messages.entry(thread_id).or_default().push(body);
    Json(json!({ "id": "msg" }))
}

async fn list_messages(State(state): State<Shared>, Path(thread_id): Path<String>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    state.requests += 1;

    let mut data: Vec<Value> = state
        .messages
        .get(&thread_id)
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, body)| {
            json!({
                "id": format!("msg_{}", i),
                "role": body["role"],
                "created_at": i,
                "content": [{ "type": "text", "text": { "value": body["content"] } }]
            })
        })
        .collect();
    if let Some(reply) = &state.reply {
        data.push(json!({
            "id": "msg_reply",
            "role": "assistant",
            "created_at": data.len(),
            "content": [{ "type": "text", "text": { "value": reply } }]
        }));
    }
    data.reverse();

    Json(json!({ "data": data }))
}

async fn start_run(State(state): State<Shared>) -> Json<Value> {
    state.lock().unwrap().requests += 1;
    Json(json!({ "id": "run_1", "status": "queued" }))
}

async fn get_run(State(state): State<Shared>, Path((_thread, run_id)): Path<(String, String)>) -> Json<Value> {
    let mut state = state.lock().unwrap();
    state.requests += 1;
    Json(json!({ "id": run_id, "status": state.run_status }))
}

async fn list_assistants(State(state): State<Shared>) -> Json<Value> {
    state.lock().unwrap().requests += 1;
    Json(json!({
        "data": [
            { "id": "asst_1", "name": "Market Analyst", "metadata": { "description": "Sizing and trends" } },
            { "id": "asst_2", "name": null, "metadata": { "title": "Partner Scout" } }
        ]
    }))
}

async fn create_response(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    state.lock().unwrap().requests += 1;
    let count = body["input"].as_array().map(Vec::len).unwrap_or_default();
    Json(json!({ "output_text": format!("Direct answer to {} message(s)", count) }))
}

/// Knobs for [`build_app`]
pub struct TestOptions {
    pub api_key: Option<&'static str>,
    pub base_path: Option<&'static str>,
    pub attachment_mode: AttachmentMode,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            api_key: Some("sk-test"),
            base_path: None,
            attachment_mode: AttachmentMode::Inline,
        }
    }
}

/// Full application router pointed at `upstream`, with a fast poll budget
pub async fn build_app(upstream: &MockUpstream, options: TestOptions) -> (Router, TempDir) {
    let tmp = TempDir::new().unwrap();

    let mut service_config = ServiceConfig::default()
        .with_base_url(&upstream.base_url)
        .with_attachment_mode(options.attachment_mode)
        .with_poll(PollConfig {
            interval: Duration::from_millis(1),
            max_attempts: 5,
        });
    service_config.api_key = options.api_key.map(str::to_string);

    let server_config = ServerConfig {
        uploads_dir: tmp.path().join("uploads"),
        base_path: options.base_path.map(str::to_string),
        ..ServerConfig::default()
    };

    let state = AppState::new(&service_config, server_config.uploads_dir.clone())
        .await
        .unwrap();

    (build_router(state, &server_config), tmp)
}
