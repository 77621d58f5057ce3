//! Scripted transport for driving adapters without a network.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use polychat_core::{
    BodyStream, ChatError, OllamaSettings, OpenAiSettings, ServerStatus, Settings, Transport,
    TransportRequest, TransportResponse,
};

/// One scripted response, matched against a URL fragment.
pub struct MockResponse {
    ok: bool,
    chunks: Vec<Vec<u8>>,
    has_body: bool,
    hang_after: bool,
}

impl MockResponse {
    /// Successful response delivered in exactly these chunks.
    pub fn stream(chunks: &[&[u8]]) -> Self {
        Self {
            ok: true,
            chunks: chunks.iter().map(|c| c.to_vec()).collect(),
            has_body: true,
            hang_after: false,
        }
    }

    /// Error-status response with the given body.
    pub fn error(body: &[u8]) -> Self {
        Self {
            ok: false,
            chunks: vec![body.to_vec()],
            has_body: true,
            hang_after: false,
        }
    }

    /// Successful status but no body stream at all.
    pub fn no_body() -> Self {
        Self {
            ok: true,
            chunks: Vec::new(),
            has_body: false,
            hang_after: false,
        }
    }

    /// Delivers the chunks, then never completes. For cancellation tests.
    pub fn hanging(chunks: &[&[u8]]) -> Self {
        let mut response = Self::stream(chunks);
        response.hang_after = true;
        response
    }
}

/// A request as the mock saw it.
pub struct SeenRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

/// Transport that answers from scripted routes and records every request.
pub struct MockTransport {
    routes: Vec<(String, MockResponse)>,
    pub seen: Mutex<Vec<SeenRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Script a response for any URL containing `fragment`.
    pub fn route(mut self, fragment: &str, response: MockResponse) -> Self {
        self.routes.push((fragment.to_string(), response));
        self
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, ChatError> {
        self.seen.lock().unwrap().push(SeenRequest {
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
        });

        let (_, response) = self
            .routes
            .iter()
            .find(|(fragment, _)| request.url.contains(fragment.as_str()))
            .unwrap_or_else(|| panic!("no scripted route for {}", request.url));

        let body = if response.has_body {
            let chunks: Vec<Result<Bytes, ChatError>> = response
                .chunks
                .iter()
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect();
            let stream = stream::iter(chunks);
            let stream: BodyStream = if response.hang_after {
                Box::pin(stream.chain(stream::pending()))
            } else {
                Box::pin(stream)
            };
            Some(stream)
        } else {
            None
        };

        Ok(TransportResponse {
            ok: response.ok,
            body,
        })
    }
}

/// Settings pointing both backends at the mock, with the given statuses.
pub fn settings(ollama_status: ServerStatus, openai_status: ServerStatus) -> Settings {
    Settings {
        ollama: OllamaSettings {
            server: Some("http://ollama.mock".to_string()),
            status: ollama_status,
        },
        openai: OpenAiSettings {
            server: "http://openai.mock".to_string(),
            api_key: Some("sk-test".to_string()),
            status: openai_status,
        },
    }
}
