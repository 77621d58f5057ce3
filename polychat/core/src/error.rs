//! Error Taxonomy
//!
//! All failure modes surfaced by the client core. Nothing here is retried
//! internally: retry policy, if any, belongs to the caller. Events already
//! delivered to a callback before a failure are not retracted.
//!
//! Cancellation is deliberately absent from this taxonomy: a cancelled call
//! resolves `Ok(())` without further callbacks.

use thiserror::Error;

/// Errors produced by the chat client core.
#[derive(Debug, Error)]
pub enum ChatError {
    /// A backend tag matched no known adapter, or an operation was invoked
    /// on a backend that does not support it.
    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),

    /// The transport returned no response body where a stream was required.
    #[error("response is missing body")]
    NoBody,

    /// A stream segment failed to parse as the expected JSON shape.
    /// Fatal: remaining stream processing for the call is aborted.
    #[error("malformed stream record: {reason}")]
    MalformedRecord {
        /// What failed to parse, including the decode error text.
        reason: String,
    },

    /// The backend's own error payload, passed through verbatim. Either an
    /// error-status response body or an in-stream error record.
    #[error("{0}")]
    BackendReported(String),

    /// Underlying network or transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// A required endpoint or credential is absent from settings.
    #[error("missing configuration: {0}")]
    MissingConfiguration(&'static str),
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
