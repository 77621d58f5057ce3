//! Switchboard
//!
//! The central point of polymorphism: given a model tagged with its owning
//! backend, the switchboard selects the matching adapter and exposes a
//! facade over chat, pull, catalog aggregation, and connectivity checks.
//!
//! Adapters are cheap, stateless constructions over shared settings and
//! transport, so the switchboard builds them fresh per call rather than
//! caching instances.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::backend::{
    Backend, ChatRequest, ChatStrategy, EventSink, Model, OllamaStrategy, OpenAiStrategy,
    ProgressSink, PullRequest,
};
use crate::catalog;
use crate::config::Settings;
use crate::error::ChatError;
use crate::session::SessionEntry;
use crate::transport::{HttpTransport, Transport};

/// Facade over every backend adapter.
pub struct Switchboard {
    settings: Arc<Settings>,
    transport: Arc<dyn Transport>,
}

impl Switchboard {
    /// Create a switchboard over the given settings and transport.
    pub fn new(settings: Arc<Settings>, transport: Arc<dyn Transport>) -> Self {
        Self {
            settings,
            transport,
        }
    }

    /// Create a switchboard with the production HTTP transport.
    pub fn with_http(settings: Settings) -> Result<Self, ChatError> {
        Ok(Self::new(
            Arc::new(settings),
            Arc::new(HttpTransport::new()?),
        ))
    }

    /// Select the adapter for a backend tag. Exhaustive over the closed
    /// set of backend kinds.
    #[must_use]
    pub fn strategy_for(&self, backend: Backend) -> Box<dyn ChatStrategy> {
        match backend {
            Backend::Ollama => Box::new(OllamaStrategy::new(
                Arc::clone(&self.settings),
                Arc::clone(&self.transport),
            )),
            Backend::OpenAi => Box::new(OpenAiStrategy::new(
                Arc::clone(&self.settings),
                Arc::clone(&self.transport),
            )),
        }
    }

    fn strategies(&self) -> Vec<Box<dyn ChatStrategy>> {
        vec![
            self.strategy_for(Backend::Ollama),
            self.strategy_for(Backend::OpenAi),
        ]
    }

    /// Issue a streaming chat call against the model's backend.
    pub async fn chat(
        &self,
        model: &Model,
        request: &ChatRequest,
        cancel: CancellationToken,
        on_event: EventSink<'_>,
    ) -> Result<(), ChatError> {
        self.strategy_for(model.backend)
            .chat(request, cancel, on_event)
            .await
    }

    /// Issue a streaming model download against the model's backend.
    pub async fn pull(
        &self,
        model: &Model,
        request: &PullRequest,
        on_progress: ProgressSink<'_>,
    ) -> Result<(), ChatError> {
        self.strategy_for(model.backend)
            .pull(request, on_progress)
            .await
    }

    /// Aggregate every backend's model listing concurrently.
    pub async fn list_all_models(&self) -> Result<Vec<Model>, ChatError> {
        catalog::list_all(&self.strategies()).await
    }

    /// Rank catalog models by most recent session usage.
    #[must_use]
    pub fn recent_models(
        &self,
        sessions: &[SessionEntry],
        models: &[Model],
        limit: usize,
    ) -> Vec<Model> {
        catalog::recent_models(sessions, models, limit)
    }

    /// Last-known connectivity of the backend serving `model_name`.
    ///
    /// Returns `false` when the name resolves to no catalog entry; never
    /// an error.
    #[must_use]
    pub fn is_connected(&self, model_name: &str, models: &[Model]) -> bool {
        models
            .iter()
            .find(|m| m.name == model_name)
            .is_some_and(|m| self.strategy_for(m.backend).is_connected())
    }
}
