//! Chat Strategy Contract
//!
//! The common interface every backend adapter implements, plus the generic
//! request/response shapes shared across backends. Adapters are stateless:
//! they read settings at call time and retain nothing between calls.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::ChatError;

/// The closed set of backend kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Local Ollama model server.
    Ollama,
    /// Hosted OpenAI-compatible completion API.
    OpenAi,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::OpenAi => write!(f, "openai"),
        }
    }
}

impl FromStr for Backend {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAi),
            other => Err(ChatError::UnsupportedBackend(other.to_string())),
        }
    }
}

/// A model, tagged with the backend that serves it.
///
/// `name` is unique within one backend's listing; two backends may expose
/// same-named models, which remain distinct catalog entries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Model {
    /// Model identifier, unique within its backend.
    pub name: String,
    /// Backend that owns this model.
    pub backend: Backend,
    /// Size in bytes, when the backend reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Last-modified timestamp, verbatim from the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    /// Remaining backend-specific metadata, opaque to the core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Model {
    /// Create a model with just a name and backend tag.
    pub fn new(name: impl Into<String>, backend: Backend) -> Self {
        Self {
            name: name.into(),
            backend,
            size: None,
            modified_at: None,
            details: None,
        }
    }
}

/// Who authored a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction.
    System,
    /// End user.
    User,
    /// The model.
    Assistant,
    /// Tool output.
    Tool,
}

/// One message in a conversation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message author.
    pub role: MessageRole,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Create a message.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A chat call: target model, prior messages, optional generation
/// parameters passed through opaquely. Immutable once issued.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Target model name.
    pub model: String,
    /// Ordered conversation history, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Backend-specific generation parameters (temperature and friends),
    /// forwarded without interpretation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,
}

impl ChatRequest {
    /// Create a request for `model` with the given history.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: None,
        }
    }

    /// Attach opaque generation parameters.
    #[must_use]
    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = Some(options);
        self
    }
}

/// One incremental unit of chat output, delivered in strict arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// A role-attributed text fragment.
    Delta {
        /// Author of the fragment.
        role: MessageRole,
        /// Text delta.
        content: String,
    },
    /// The backend signalled end of stream.
    Done,
}

/// A model download request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PullRequest {
    /// Name of the model to download.
    pub model: String,
}

impl PullRequest {
    /// Create a pull request for `model`.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

/// One progress record from a streaming model download.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullProgress {
    /// Current phase, e.g. `pulling manifest`.
    pub status: Option<String>,
    /// Layer digest being transferred.
    pub digest: Option<String>,
    /// Total bytes for the current layer.
    pub total: Option<u64>,
    /// Bytes transferred so far.
    pub completed: Option<u64>,
}

/// Callback receiving chat stream events.
pub type EventSink<'a> = &'a mut (dyn FnMut(StreamEvent) + Send);

/// Callback receiving pull progress records.
pub type ProgressSink<'a> = &'a mut (dyn FnMut(PullProgress) + Send);

/// The common contract every backend adapter implements.
///
/// Adapters map the generic shapes above to their backend's wire format and
/// drive the stream tokenizer. All errors surface through the returned
/// `Result`; cancellation resolves `Ok(())` without further callbacks.
#[async_trait]
pub trait ChatStrategy: Send + Sync {
    /// The backend this adapter speaks to.
    fn backend(&self) -> Backend;

    /// Issue a streaming chat call, invoking `on_event` once per event in
    /// arrival order. Resolves when the stream ends or `cancel` fires.
    async fn chat(
        &self,
        request: &ChatRequest,
        cancel: CancellationToken,
        on_event: EventSink<'_>,
    ) -> Result<(), ChatError>;

    /// Fetch this backend's models, each tagged with this backend and
    /// sorted by the catalog collation.
    async fn list_models(&self) -> Result<Vec<Model>, ChatError>;

    /// Last-known connectivity state, read from settings. Non-blocking;
    /// never a fresh network probe.
    fn is_connected(&self) -> bool;

    /// Whether this backend can download models.
    fn supports_pull(&self) -> bool {
        false
    }

    /// Issue a streaming model download, invoking `on_progress` once per
    /// progress record.
    async fn pull(
        &self,
        request: &PullRequest,
        on_progress: ProgressSink<'_>,
    ) -> Result<(), ChatError> {
        let _ = (request, on_progress);
        Err(ChatError::UnsupportedBackend(format!(
            "{} does not support model pull",
            self.backend()
        )))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn backend_round_trips_through_str() {
        assert_eq!("ollama".parse::<Backend>().unwrap(), Backend::Ollama);
        assert_eq!("openai".parse::<Backend>().unwrap(), Backend::OpenAi);
        assert_eq!(Backend::Ollama.to_string(), "ollama");

        let err = "gemini".parse::<Backend>().unwrap_err();
        assert!(matches!(err, ChatError::UnsupportedBackend(_)));
    }

    #[test]
    fn chat_request_serializes_without_empty_options() {
        let request = ChatRequest::new(
            "llama3.2",
            vec![ChatMessage::new(MessageRole::User, "hi")],
        );
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("options").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
