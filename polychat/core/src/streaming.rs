//! Streaming Response Tokenizer
//!
//! Turns the raw byte stream of a chunked-transfer response into discrete
//! newline-delimited JSON records. Two buffers carry state across reads:
//!
//! - undecoded trailing bytes, so a multi-byte UTF-8 character split across
//!   chunk boundaries decodes intact, and
//! - a pending partial line, so a record split across chunk boundaries is
//!   parsed only once it is complete. Backends flush mid-record often enough
//!   that naive per-chunk splitting silently corrupts records.
//!
//! The final unterminated segment, if any, is flushed at stream end.

use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ChatError;
use crate::transport::{BodyStream, TransportResponse};

/// Incremental decoder for newline-delimited JSON streams.
#[derive(Debug, Default)]
pub struct NdjsonDecoder {
    /// Bytes that did not yet form a complete UTF-8 sequence.
    bytes: Vec<u8>,
    /// Text that did not yet end in a newline.
    line: String,
}

impl NdjsonDecoder {
    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every record it completed, in order.
    ///
    /// Records are trimmed; empty segments are discarded. An incomplete
    /// trailing segment stays buffered for the next call.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<String>, ChatError> {
        self.bytes.extend_from_slice(chunk);

        let valid_up_to = match std::str::from_utf8(&self.bytes) {
            Ok(_) => self.bytes.len(),
            // An incomplete sequence at the buffer end carries forward.
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                return Err(ChatError::MalformedRecord {
                    reason: format!("stream is not valid UTF-8: {e}"),
                })
            }
        };

        let rest = self.bytes.split_off(valid_up_to);
        let prefix = std::mem::replace(&mut self.bytes, rest);
        let text = String::from_utf8(prefix).map_err(|e| ChatError::MalformedRecord {
            reason: format!("stream is not valid UTF-8: {e}"),
        })?;
        self.line.push_str(&text);

        let mut records = Vec::new();
        while let Some(pos) = self.line.find('\n') {
            let segment: String = self.line.drain(..=pos).collect();
            let segment = segment.trim();
            if !segment.is_empty() {
                records.push(segment.to_string());
            }
        }
        Ok(records)
    }

    /// Flush the buffered trailing segment at end of stream.
    ///
    /// Fails if the stream ended mid-character.
    pub fn finish(&mut self) -> Result<Option<String>, ChatError> {
        if !self.bytes.is_empty() {
            return Err(ChatError::MalformedRecord {
                reason: "stream ended mid UTF-8 sequence".to_string(),
            });
        }
        let rest = std::mem::take(&mut self.line);
        let rest = rest.trim();
        Ok(if rest.is_empty() {
            None
        } else {
            Some(rest.to_string())
        })
    }
}

/// Drive a streamed response to completion, invoking `on_record` once per
/// complete record in arrival order.
///
/// An error-status response is not record-split: its body is collected and
/// parsed as a single JSON error object.
pub(crate) async fn drain_ndjson<F>(
    response: TransportResponse,
    mut on_record: F,
) -> Result<(), ChatError>
where
    F: FnMut(&str) -> Result<(), ChatError> + Send,
{
    let mut body = response.body.ok_or(ChatError::NoBody)?;
    if !response.ok {
        return Err(read_error_body(body).await);
    }

    let mut decoder = NdjsonDecoder::new();
    let mut records = 0usize;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        for record in decoder.push(&chunk)? {
            on_record(&record)?;
            records += 1;
        }
    }
    if let Some(record) = decoder.finish()? {
        on_record(&record)?;
        records += 1;
    }
    debug!(records, "stream complete");
    Ok(())
}

/// Collect a non-streamed JSON response body into `T`.
pub(crate) async fn read_json_body<T: DeserializeOwned>(
    response: TransportResponse,
) -> Result<T, ChatError> {
    let mut body = response.body.ok_or(ChatError::NoBody)?;
    if !response.ok {
        return Err(read_error_body(body).await);
    }

    let mut raw = Vec::new();
    while let Some(chunk) = body.next().await {
        raw.extend_from_slice(&chunk?);
    }
    serde_json::from_slice(&raw).map_err(|e| ChatError::MalformedRecord {
        reason: format!("response body did not parse: {e}"),
    })
}

/// Collect an error-status body and turn it into the backend's reported
/// error. A transport failure mid-body takes precedence.
async fn read_error_body(mut body: BodyStream) -> ChatError {
    let mut raw = Vec::new();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => raw.extend_from_slice(&bytes),
            Err(e) => return e,
        }
    }
    warn!(len = raw.len(), "backend returned error status");
    parse_error_payload(&raw)
}

/// Parse one stream record into its expected JSON shape. A failure here is
/// fatal for the remaining stream.
pub(crate) fn parse_record<T: DeserializeOwned>(record: &str) -> Result<T, ChatError> {
    serde_json::from_str(record).map_err(|e| ChatError::MalformedRecord {
        reason: format!("record did not parse: {e}"),
    })
}

/// Parse a backend error payload, tolerating both `{"error": "…"}` and
/// `{"error": {"message": "…"}}` shapes.
pub(crate) fn parse_error_payload(raw: &[u8]) -> ChatError {
    match serde_json::from_slice::<ErrorBody>(raw) {
        Ok(body) => ChatError::BackendReported(body.message()),
        Err(e) => ChatError::MalformedRecord {
            reason: format!("error response was not a JSON error object: {e}"),
        },
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorPayload,
}

impl ErrorBody {
    fn message(self) -> String {
        match self.error {
            ErrorPayload::Message(m) => m,
            ErrorPayload::Detailed { message } => message,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorPayload {
    Message(String),
    Detailed { message: String },
}
