//! Hosted API Adapter
//!
//! Speaks the OpenAI-compatible wire format:
//!
//! - `POST {base}/v1/chat/completions` with `stream: true`: server-sent
//!   events, one `data: {json}` line per chunk, terminated by
//!   `data: [DONE]`
//! - `GET  {base}/v1/models`: model listing under `data[].id`
//!
//! Requests carry a bearer token from [`Settings`]. The SSE framing rides
//! on the same newline-delimited tokenizer as the local backend: each
//! record is one line, non-`data:` lines are skipped.

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
    Backend, ChatRequest, ChatStrategy, EventSink, MessageRole, Model, StreamEvent,
};

/// Adapter for the hosted OpenAI-compatible API.
pub struct OpenAiStrategy {
    settings: Arc<Settings>,
    transport: Arc<dyn Transport>,
}

impl OpenAiStrategy {
    /// Create an adapter over the given settings and transport.
    pub fn new(settings: Arc<Settings>, transport: Arc<dyn Transport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.settings.openai.server)
    }

    fn authorized(&self, request: TransportRequest) -> Result<TransportRequest, ChatError> {
        let key = self.settings.openai_api_key()?;
        Ok(request.header("Authorization", format!("Bearer {key}")))
    }

    async fn run_chat(
        &self,
        request: &ChatRequest,
        on_event: EventSink<'_>,
    ) -> Result<(), ChatError> {
        let url = self.endpoint("/v1/chat/completions");
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "stream": true,
        });
        // Generation parameters are top-level fields in this schema.
        if let Some(serde_json::Value::Object(options)) = &request.options {
            if let Some(map) = body.as_object_mut() {
                for (key, value) in options {
                    map.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
        }

        debug!(model = %request.model, "starting hosted chat stream");
        let response = self
            .transport
            .request(self.authorized(TransportRequest::post(url, body))?)
            .await?;

        let mut done = false;
        drain_ndjson(response, |record| {
            if done {
                return Ok(());
            }
            let Some(payload) = record.strip_prefix("data:").map(str::trim) else {
                // SSE comments and event-name lines carry no payload.
                return Ok(());
            };
            if payload == "[DONE]" {
                done = true;
                on_event(StreamEvent::Done);
                return Ok(());
            }

            let chunk: CompletionChunk = parse_record(payload)?;
            if let Some(error) = chunk.error {
                return Err(ChatError::BackendReported(error.message));
            }
            for choice in chunk.choices {
                if let Some(content) = choice.delta.content {
                    on_event(StreamEvent::Delta {
                        role: choice.delta.role.unwrap_or(MessageRole::Assistant),
                        content,
                    });
                }
                if choice.finish_reason.is_some() && !done {
                    done = true;
                    on_event(StreamEvent::Done);
                }
            }
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl ChatStrategy for OpenAiStrategy {
    fn backend(&self) -> Backend {
        Backend::OpenAi
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
        let url = self.endpoint("/v1/models");
        let response = self
            .transport
            .request(self.authorized(TransportRequest::get(url))?)
            .await?;
        let listing: ModelListing = read_json_body(response).await?;

        let mut models: Vec<Model> = listing
            .data
            .into_iter()
            .map(|entry| Model::new(entry.id, Backend::OpenAi))
            .collect();
        catalog::sort_by_name(&mut models);
        Ok(models)
    }

    fn is_connected(&self) -> bool {
        self.settings.openai.status == ServerStatus::Connected
    }
}

#[derive(Deserialize)]
struct ModelListing {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[derive(Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ChunkError>,
}

#[derive(Deserialize)]
struct ChunkError {
    message: String,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Delta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct Delta {
    role: Option<MessageRole>,
    content: Option<String>,
}
