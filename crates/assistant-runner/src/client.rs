//! Assistants API HTTP client
//!
//! Speaks the threads/runs/messages endpoints of the remote assistant
//! service, plus the single-shot responses and assistant listing calls.

use async_trait::async_trait;
use reqwest::{multipart, Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error};

use relay_core::conversation::{ChatMessage, ConversationEntry, MessageRole, OutboundMessage, Reply};

use crate::config::ServiceConfig;
use crate::error::{RelayError, Result};
use crate::service::{ConversationService, FileUpload, RunHandle};

/// Temperature used for single-shot completions
const RESPONSE_TEMPERATURE: f64 = 0.3;

/// Page size when reading a thread back
const LIST_LIMIT: &str = "100";

#[derive(Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Deserialize)]
struct RunObject {
    id: String,
    status: String,
}

#[derive(Deserialize)]
struct MessageList {
    #[serde(default)]
    data: Vec<WireMessage>,
}

#[derive(Deserialize)]
struct WireMessage {
    id: String,
    role: String,
    #[serde(default)]
    created_at: i64,
    #[serde(default)]
    content: Vec<WireContent>,
}

#[derive(Deserialize)]
struct WireContent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<WireText>,
}

#[derive(Deserialize)]
struct WireText {
    value: String,
}

#[derive(Deserialize)]
struct AssistantList {
    #[serde(default)]
    data: Vec<WireAssistant>,
}

#[derive(Deserialize)]
struct WireAssistant {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    metadata: Option<Value>,
}

/// An assistant persona available on the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssistantSummary {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<WireAssistant> for AssistantSummary {
    fn from(wire: WireAssistant) -> Self {
        let meta = |key: &str| {
            wire.metadata
                .as_ref()
                .and_then(|m| m.get(key))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let name = wire
            .name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| meta("title"))
            .unwrap_or_else(|| "Assistant".to_string());
        let description = meta("description").unwrap_or_default();

        Self {
            id: wire.id,
            name,
            description,
        }
    }
}

/// Client for the remote assistant service
pub struct AssistantsClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl AssistantsClient {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(RelayError::MissingCredentials)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let api_key = self.api_key()?;
        Ok(self
            .client
            .request(method, format!("{}/{}", self.base_url, path))
            .bearer_auth(api_key)
            .header("OpenAI-Beta", "assistants=v2"))
    }

    async fn send(builder: RequestBuilder, operation: &str) -> Result<Response> {
        let resp = builder
            .send()
            .await
            .map_err(|e| RelayError::transport(operation, e))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            error!("{}: HTTP {} {}", operation, status, text);
            return Err(RelayError::remote(operation, status, text));
        }

        Ok(resp)
    }

    async fn parse<T: DeserializeOwned>(resp: Response, operation: &str) -> Result<T> {
        resp.json::<T>()
            .await
            .map_err(|e| RelayError::transport(operation, e))
    }

    fn thread_path(context_id: &str, rest: &str) -> String {
        format!("threads/{}{}", urlencoding::encode(context_id), rest)
    }

    /// Single-shot completion without a conversation context
    pub async fn create_response(&self, messages: &[ChatMessage]) -> Result<Reply> {
        let operation = "Failed to generate response";
        let builder = self.request(Method::POST, "responses")?.json(&json!({
            "model": self.model,
            "input": messages,
            "temperature": RESPONSE_TEMPERATURE,
        }));

        let resp = Self::send(builder, operation).await?;
        let data: Value = Self::parse(resp, operation).await?;

        Ok(extract_output_text(&data)
            .filter(|text| !text.is_empty())
            .map(Reply::new)
            .unwrap_or_else(Reply::fallback))
    }

    /// List the assistants configured on the remote service
    pub async fn list_assistants(&self) -> Result<Vec<AssistantSummary>> {
        let operation = "Failed to list assistants";
        let resp = Self::send(self.request(Method::GET, "assistants")?, operation).await?;
        let list: AssistantList = Self::parse(resp, operation).await?;

        Ok(list.data.into_iter().map(AssistantSummary::from).collect())
    }
}

/// Pull the reply text out of a responses payload.
///
/// Prefers the `output_text` convenience field, otherwise joins every
/// `output_text` part of every output item.
pub fn extract_output_text(data: &Value) -> Option<String> {
    if let Some(text) = data.get("output_text").and_then(Value::as_str) {
        return Some(text.to_string());
    }

    let parts: Vec<&str> = data
        .get("output")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|content| content.get("type").and_then(Value::as_str) == Some("output_text"))
        .filter_map(|content| content.get("text").and_then(Value::as_str))
        .collect();

    Some(parts.join("\n"))
}

#[async_trait]
impl ConversationService for AssistantsClient {
    fn ensure_configured(&self) -> Result<()> {
        self.api_key().map(|_| ())
    }

    async fn create_context(&self) -> Result<String> {
        let operation = "Failed to create thread";
        let builder = self.request(Method::POST, "threads")?.json(&json!({}));
        let resp = Self::send(builder, operation).await?;
        let thread: IdObject = Self::parse(resp, operation).await?;
        Ok(thread.id)
    }

    async fn register_file(&self, upload: FileUpload) -> Result<String> {
        let operation = "Failed to upload file";

        let part = multipart::Part::bytes(upload.bytes).file_name(upload.name.clone());
        let part = match upload.mime.as_deref() {
            Some(mime) => part.mime_str(mime).map_err(|e| RelayError::transport(operation, e))?,
            None => part,
        };
        let form = multipart::Form::new()
            .text("purpose", upload.purpose)
            .part("file", part);

        let builder = self.request(Method::POST, "files")?.multipart(form);
        let resp = Self::send(builder, operation).await?;
        let file: IdObject = Self::parse(resp, operation).await?;

        debug!("Registered file {} as {}", upload.name, file.id);
        Ok(file.id)
    }

    async fn append_message(&self, context_id: &str, message: &OutboundMessage) -> Result<()> {
        let mut body = json!({
            "role": message.role.as_str(),
            "content": message.content,
        });
        if !message.file_ids.is_empty() {
            let attachments: Vec<Value> = message
                .file_ids
                .iter()
                .map(|file_id| json!({ "file_id": file_id, "tools": [{ "type": "file_search" }] }))
                .collect();
            body["attachments"] = Value::Array(attachments);
        }

        let builder = self
            .request(Method::POST, &Self::thread_path(context_id, "/messages"))?
            .json(&body);
        Self::send(builder, "Failed to add message").await?;
        Ok(())
    }

    async fn start_run(&self, context_id: &str, assistant_id: &str) -> Result<RunHandle> {
        let operation = "Failed to run assistant";
        let builder = self
            .request(Method::POST, &Self::thread_path(context_id, "/runs"))?
            .json(&json!({ "assistant_id": assistant_id }));
        let resp = Self::send(builder, operation).await?;
        let run: RunObject = Self::parse(resp, operation).await?;

        Ok(RunHandle {
            id: run.id,
            status: run.status,
        })
    }

    async fn run_status(&self, context_id: &str, run_id: &str) -> Result<String> {
        let operation = "Failed to check run status";
        let path = Self::thread_path(context_id, &format!("/runs/{}", urlencoding::encode(run_id)));
        let resp = Self::send(self.request(Method::GET, &path)?, operation).await?;
        let run: RunObject = Self::parse(resp, operation).await?;
        Ok(run.status)
    }

    async fn list_entries(&self, context_id: &str) -> Result<Vec<ConversationEntry>> {
        let operation = "Failed to retrieve response";
        let builder = self
            .request(Method::GET, &Self::thread_path(context_id, "/messages"))?
            .query(&[("order", "desc"), ("limit", LIST_LIMIT)]);
        let resp = Self::send(builder, operation).await?;
        let list: MessageList = Self::parse(resp, operation).await?;

        // Newest first on the wire
        let mut entries: Vec<ConversationEntry> = list
            .data
            .into_iter()
            .filter_map(|message| {
                let role = match message.role.as_str() {
                    "user" => MessageRole::User,
                    "assistant" => MessageRole::Assistant,
                    _ => return None,
                };
                let text = message
                    .content
                    .iter()
                    .filter(|part| part.kind == "text")
                    .filter_map(|part| part.text.as_ref().map(|t| t.value.as_str()))
                    .collect::<Vec<_>>()
                    .join("\n");

                Some(ConversationEntry {
                    id: message.id,
                    role,
                    text,
                    created_at: message.created_at,
                })
            })
            .collect();
        entries.reverse();

        Ok(entries)
    }
}
