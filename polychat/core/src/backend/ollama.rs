//! Ollama Adapter
//!
//! Speaks the local model server's wire format:
//!
//! - `POST {server}/api/chat`: newline-delimited JSON chat records
//! - `GET  {server}/api/tags`: model listing
//! - `POST {server}/api/pull`: newline-delimited download progress records
//!
//! The server base URL and connectivity status come from [`Settings`] at
//! call time; the adapter holds no other state.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::catalog;
use crate::config::{ServerStatus, Settings};
use crate::error::ChatError;
use crate::streaming::{drain_ndjson, parse_record, read_json_body};
use crate::transport::{Transport, TransportRequest};

use super::traits::{
    Backend, ChatRequest, ChatStrategy, EventSink, MessageRole, Model, ProgressSink, PullProgress,
    PullRequest, StreamEvent,
};

/// Adapter for the local Ollama server.
pub struct OllamaStrategy {
    settings: Arc<Settings>,
    transport: Arc<dyn Transport>,
}

impl OllamaStrategy {
    /// Create an adapter over the given settings and transport.
    pub fn new(settings: Arc<Settings>, transport: Arc<dyn Transport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    fn endpoint(&self, path: &str) -> Result<String, ChatError> {
        Ok(format!("{}{path}", self.settings.ollama_server()?))
    }

    async fn run_chat(
        &self,
        request: &ChatRequest,
        on_event: EventSink<'_>,
    ) -> Result<(), ChatError> {
        let url = self.endpoint("/api/chat")?;
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "stream": true,
        });
        if let Some(options) = &request.options {
            body["options"] = options.clone();
        }

        debug!(model = %request.model, "starting ollama chat stream");
        let response = self
            .transport
            .request(TransportRequest::post(url, body))
            .await?;

        drain_ndjson(response, |record| {
            let chunk: OllamaChatChunk = parse_record(record)?;
            if let Some(error) = chunk.error {
                return Err(ChatError::BackendReported(error));
            }
            if let Some(message) = chunk.message {
                on_event(StreamEvent::Delta {
                    role: message.role.unwrap_or(MessageRole::Assistant),
                    content: message.content,
                });
            }
            if chunk.done {
                on_event(StreamEvent::Done);
            }
            Ok(())
        })
        .await
    }

    async fn run_pull(
        &self,
        request: &PullRequest,
        on_progress: ProgressSink<'_>,
    ) -> Result<(), ChatError> {
        let url = self.endpoint("/api/pull")?;
        let body = serde_json::json!({
            "model": request.model,
            "stream": true,
        });

        debug!(model = %request.model, "starting ollama pull stream");
        let response = self
            .transport
            .request(TransportRequest::post(url, body))
            .await?;

        drain_ndjson(response, |record| {
            let chunk: OllamaPullChunk = parse_record(record)?;
            if let Some(error) = chunk.error {
                return Err(ChatError::BackendReported(error));
            }
            on_progress(chunk.progress);
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl ChatStrategy for OllamaStrategy {
    fn backend(&self) -> Backend {
        Backend::Ollama
    }

    async fn chat(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
        on_event: EventSink<'_>,
    ) -> Result<(), ChatError> {
        // Biased: a fired token always wins over a ready chunk, so no
        // events are delivered after cancellation.
        tokio::select! {
            biased;
            () = cancel.cancelled() => Ok(()),
            result = self.run_chat(request, on_event) => result,
        }
    }

    async fn list_models(&self) -> Result<Vec<Model>, ChatError> {
        let url = self.endpoint("/api/tags")?;
        let response = self.transport.request(TransportRequest::get(url)).await?;
        let tags: TagsResponse = read_json_body(response).await?;

        let mut models: Vec<Model> = tags
            .models
            .into_iter()
            .map(|entry| Model {
                name: entry.name,
                backend: Backend::Ollama,
                size: entry.size,
                modified_at: entry.modified_at,
                details: entry.details,
            })
            .collect();
        catalog::sort_by_name(&mut models);
        Ok(models)
    }

    fn is_connected(&self) -> bool {
        self.settings.ollama.status == ServerStatus::Connected
    }

    fn supports_pull(&self) -> bool {
        true
    }

    async fn pull(
        &self,
        request: &PullRequest,
        on_progress: ProgressSink<'_>,
    ) -> Result<(), ChatError> {
        self.run_pull(request, on_progress).await
    }
}

#[derive(Deserialize)]
struct OllamaChatChunk {
    message: Option<WireMessage>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

/// Chat record message; some server builds omit the role on deltas.
#[derive(Deserialize)]
struct WireMessage {
    role: Option<MessageRole>,
    content: String,
}

#[derive(Deserialize)]
struct OllamaPullChunk {
    error: Option<String>,
    #[serde(flatten)]
    progress: PullProgress,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
    size: Option<u64>,
    modified_at: Option<String>,
    details: Option<serde_json::Value>,
}
