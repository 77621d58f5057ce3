//! Transport Layer
//!
//! The narrow HTTP seam the core depends on. Adapters build a
//! [`TransportRequest`], hand it to a [`Transport`], and get back a status
//! flag plus a streamed response body. The core never touches a concrete
//! HTTP client outside this module, which keeps every adapter testable with
//! a scripted transport.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use tracing::debug;

use crate::error::ChatError;

/// A streamed response body: chunks of bytes in arrival order.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, ChatError>> + Send>>;

/// HTTP method, restricted to what the backends need.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// Idempotent fetch (model listings).
    Get,
    /// Request with a JSON body (chat, pull).
    Post,
}

/// A request for the transport to perform.
#[derive(Debug)]
pub struct TransportRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Extra headers, e.g. `Authorization`.
    pub headers: Vec<(String, String)>,
    /// JSON body for POST requests.
    pub body: Option<serde_json::Value>,
}

impl TransportRequest {
    /// Build a GET request.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Build a POST request with a JSON body.
    #[must_use]
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            headers: Vec::new(),
            body: Some(body),
        }
    }

    /// Attach a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A response as the core sees it: success flag and an optional body stream.
pub struct TransportResponse {
    /// Whether the status code indicated success.
    pub ok: bool,
    /// The response body, streamed. `None` when the transport produced no
    /// body at all.
    pub body: Option<BodyStream>,
}

/// The transport primitive the adapters drive.
///
/// Implementations perform the request and expose the body as a byte
/// stream without buffering it whole. Cancellation is cooperative and
/// handled above this seam: callers drop the returned stream to abort the
/// underlying connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform the request and return the streamed response.
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, ChatError>;
}

/// Production transport backed by [`reqwest`].
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a connect timeout.
    ///
    /// No total request timeout: chat streams stay open for as long as the
    /// backend generates.
    pub fn new() -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, request: TransportRequest) -> Result<TransportResponse, ChatError> {
        debug!(url = %request.url, method = ?request.method, "issuing request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let ok = response.status().is_success();
        let body: BodyStream = Box::pin(
            response
                .bytes_stream()
                .map_err(|e| ChatError::Transport(e.to_string())),
        );

        Ok(TransportResponse {
            ok,
            body: Some(body),
        })
    }
}
