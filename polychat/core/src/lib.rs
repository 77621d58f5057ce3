//! Polychat Core - Unified Streaming Client for Multi-Backend Chat
//!
//! This crate lets a chat application talk to heterogeneous chat backends
//! (a local Ollama server and a hosted OpenAI-style API) through one
//! interface, streaming incremental tokens to the caller as they arrive.
//! It is pure client logic: no UI, no storage, no HTTP server.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Caller (UI)                          │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┼───────────────────────────────┐
//! │                       Switchboard                            │
//! │   strategy_for(backend) ── dispatch by closed Backend tag    │
//! │  ┌──────────────────┐              ┌───────────────────┐     │
//! │  │  OllamaStrategy  │              │  OpenAiStrategy   │     │
//! │  │  NDJSON records  │              │  SSE data: lines  │     │
//! │  └────────┬─────────┘              └─────────┬─────────┘     │
//! │           └────────────┬─────────────────────┘               │
//! │                 NdjsonDecoder                                │
//! │     (UTF-8 carry + partial-line buffering across chunks)     │
//! │                        │                                     │
//! │                   Transport trait                            │
//! │              (reqwest behind a narrow seam)                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Switchboard`]: dispatcher and facade over every backend adapter
//! - [`ChatStrategy`]: the common adapter contract (chat, list, pull)
//! - [`StreamEvent`]: one incremental unit of chat output
//! - [`Model`]: a backend-tagged catalog entry
//! - [`Settings`]: endpoints and last-known connectivity, read at call time
//! - [`Transport`]: the HTTP seam, mockable in tests
//!
//! # Quick Start
//!
//! ```ignore
//! use polychat_core::{
//!     ChatMessage, ChatRequest, MessageRole, Settings, StreamEvent, Switchboard,
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), polychat_core::ChatError> {
//!     let switchboard = Switchboard::with_http(Settings::from_env())?;
//!
//!     let catalog = switchboard.list_all_models().await?;
//!     let model = &catalog[0];
//!
//!     let request = ChatRequest::new(
//!         model.name.clone(),
//!         vec![ChatMessage::new(MessageRole::User, "Hello!")],
//!     );
//!     let cancel = CancellationToken::new();
//!     let mut on_event = |event: StreamEvent| {
//!         if let StreamEvent::Delta { content, .. } = event {
//!             print!("{content}");
//!         }
//!     };
//!     switchboard.chat(model, &request, cancel, &mut on_event).await
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: the `ChatStrategy` contract and both adapters
//! - [`catalog`]: aggregation, collation sort, recency ranking
//! - [`config`]: settings shape, TOML/env loading
//! - [`session`]: read-only session history records
//! - [`streaming`]: the chunk-boundary-safe NDJSON tokenizer
//! - [`switchboard`]: dispatch and the public facade
//! - [`transport`]: the HTTP seam and its reqwest implementation
//!
//! # Cancellation
//!
//! Every chat call takes a `CancellationToken`. Firing it settles the call
//! `Ok(())` with no further callback invocations and releases the
//! underlying connection. Cancellation is never reported as an error.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod session;
pub mod streaming;
pub mod switchboard;
pub mod transport;

pub use backend::{
    Backend, ChatMessage, ChatRequest, ChatStrategy, EventSink, MessageRole, Model,
    OllamaStrategy, OpenAiStrategy, ProgressSink, PullProgress, PullRequest, StreamEvent,
};
pub use catalog::{list_all, recent_models, sort_by_name, DEFAULT_RECENT_LIMIT};
pub use config::{
    default_config_path, ConfigError, OllamaSettings, OpenAiSettings, ServerStatus, Settings,
};
pub use error::ChatError;
pub use session::SessionEntry;
pub use streaming::NdjsonDecoder;
pub use switchboard::Switchboard;
pub use transport::{BodyStream, HttpTransport, Method, Transport, TransportRequest, TransportResponse};
