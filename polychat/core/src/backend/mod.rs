//! Backend Adapters
//!
//! One adapter per backend kind, all implementing the common
//! [`ChatStrategy`] contract: streaming chat, model listing, connectivity
//! check, and (where supported) model pull.
//!
//! # Available Backends
//!
//! - **Ollama**: local model server, NDJSON streaming, supports pull
//! - **OpenAI**: hosted completion API, SSE streaming

mod ollama;
mod openai;
mod traits;

pub use ollama::OllamaStrategy;
pub use openai::OpenAiStrategy;
pub use traits::{
    Backend, ChatMessage, ChatRequest, ChatStrategy, EventSink, MessageRole, Model, ProgressSink,
    PullProgress, PullRequest, StreamEvent,
};
