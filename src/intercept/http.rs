//! Network interception
//!
//! Decorators over the host's HTTP capabilities: the async transport and
//! the blocking transport. Each wrapped call logs a `network.request`
//! entry synchronously at call time and a `network.response` or
//! `network.error` entry at completion, paired through a correlation id
//! assigned at request time. The wrapped call's outcome is returned
//! untouched.

use super::LocationSource;
use crate::buffer::SessionBuffer;
use crate::controller::RecordingGate;
use crate::error::RetraceResult;
use crate::types::{kinds, LogEntry};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Bodies are captured as at most this many characters.
pub const SNIPPET_MAX: usize = 10_000;

/// Stand-in recorded for bodies that have no text form.
pub const OPAQUE_BODY_TOKEN: &str = "[opaque body]";

/// Request or response payload as this layer sees it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HttpBody {
    #[default]
    Empty,
    /// Textual payload, captured up to [`SNIPPET_MAX`] characters.
    Text(String),
    /// Non-text payload (multipart, binary); never serialized into the
    /// log, represented by [`OPAQUE_BODY_TOKEN`].
    Opaque,
}

impl HttpBody {
    fn snippet(&self) -> Option<String> {
        match self {
            HttpBody::Empty => None,
            HttpBody::Text(text) => Some(truncate_chars(text, SNIPPET_MAX)),
            HttpBody::Opaque => Some(OPAQUE_BODY_TOKEN.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: HttpBody,
}

impl HttpRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: Vec::new(),
            body: HttpBody::Empty,
        }
    }

    pub fn with_body(mut self, body: HttpBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: HttpBody,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: HttpBody::Empty,
        }
    }

    pub fn with_body(mut self, body: HttpBody) -> Self {
        self.body = body;
        self
    }
}

/// The host's async HTTP capability.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> RetraceResult<HttpResponse>;
}

/// The host's blocking HTTP capability.
pub trait BlockingHttpTransport: Send + Sync {
    fn send(&self, request: HttpRequest) -> RetraceResult<HttpResponse>;
}

/// One in-flight wrapped call: the id that pairs its entries and the
/// clock its duration is measured from.
pub(crate) struct RequestSpan {
    correlation_id: Uuid,
    started: Instant,
}

/// Shared request/response logging used by every network wrapper.
pub(crate) struct NetworkProbe {
    gate: RecordingGate,
    buffer: Arc<SessionBuffer>,
    location: Arc<dyn LocationSource>,
}

impl NetworkProbe {
    pub(crate) fn new(
        gate: RecordingGate,
        buffer: Arc<SessionBuffer>,
        location: Arc<dyn LocationSource>,
    ) -> Self {
        Self {
            gate,
            buffer,
            location,
        }
    }

    /// Open a span and, when recording, log the request entry.
    pub(crate) fn begin(&self, request: &HttpRequest) -> RequestSpan {
        let span = RequestSpan {
            correlation_id: Uuid::new_v4(),
            started: Instant::now(),
        };

        if self.gate.is_active() {
            self.buffer.append_log(LogEntry::new(
                kinds::NETWORK_REQUEST,
                self.location.current_url(),
                json!({
                    "method": request.method,
                    "url": request.url,
                    "headers": headers_value(&request.headers),
                    "body": request.body.snippet(),
                    "correlationId": span.correlation_id,
                }),
            ));
        }

        span
    }

    /// Close a span: when recording, log the paired response or error
    /// entry with the measured duration.
    pub(crate) fn complete(
        &self,
        span: &RequestSpan,
        request: &HttpRequest,
        outcome: &RetraceResult<HttpResponse>,
    ) {
        if !self.gate.is_active() {
            return;
        }

        let duration_ms = span.started.elapsed().as_millis() as u64;
        let entry = match outcome {
            Ok(response) => LogEntry::new(
                kinds::NETWORK_RESPONSE,
                self.location.current_url(),
                json!({
                    "method": request.method,
                    "url": request.url,
                    "status": response.status,
                    "durationMs": duration_ms,
                    "response": response.body.snippet(),
                    "correlationId": span.correlation_id,
                }),
            ),
            Err(e) => LogEntry::new(
                kinds::NETWORK_ERROR,
                self.location.current_url(),
                json!({
                    "method": request.method,
                    "url": request.url,
                    "message": e.to_string(),
                    "durationMs": duration_ms,
                    "correlationId": span.correlation_id,
                }),
            ),
        };
        self.buffer.append_log(entry);
    }
}

/// Async transport wrapper.
pub struct RecordingTransport {
    inner: Arc<dyn HttpTransport>,
    probe: NetworkProbe,
}

impl RecordingTransport {
    pub(crate) fn new(inner: Arc<dyn HttpTransport>, probe: NetworkProbe) -> Self {
        Self { inner, probe }
    }
}

#[async_trait]
impl HttpTransport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> RetraceResult<HttpResponse> {
        let span = self.probe.begin(&request);
        let outcome = self.inner.send(request.clone()).await;
        self.probe.complete(&span, &request, &outcome);
        outcome
    }
}

/// Blocking transport wrapper.
pub struct RecordingBlockingTransport {
    inner: Arc<dyn BlockingHttpTransport>,
    probe: NetworkProbe,
}

impl RecordingBlockingTransport {
    pub(crate) fn new(inner: Arc<dyn BlockingHttpTransport>, probe: NetworkProbe) -> Self {
        Self { inner, probe }
    }
}

impl BlockingHttpTransport for RecordingBlockingTransport {
    fn send(&self, request: HttpRequest) -> RetraceResult<HttpResponse> {
        let span = self.probe.begin(&request);
        let outcome = self.inner.send(request.clone());
        self.probe.complete(&span, &request, &outcome);
        outcome
    }
}

fn headers_value(headers: &[(String, String)]) -> Value {
    let mut map = Map::new();
    for (name, value) in headers {
        map.insert(name.clone(), Value::String(value.clone()));
    }
    Value::Object(map)
}

/// First `max` characters of `s`, never splitting a code point.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((index, _)) => s[..index].to_string(),
        None => s.to_string(),
    }
}
