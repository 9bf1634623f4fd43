//! Console interception
//!
//! Wraps the host's console sink, forwarding every call unchanged and,
//! while recording, appending a `console.<level>` entry. Stringification
//! never panics: a value that refuses JSON serialization falls back to
//! its display form.

use super::LocationSource;
use crate::buffer::SessionBuffer;
use crate::controller::RecordingGate;
use crate::types::LogEntry;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

/// Console severity, mirroring the usual console method set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleLevel {
    Log,
    Info,
    Warn,
    Error,
    Debug,
}

impl ConsoleLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsoleLevel::Log => "log",
            ConsoleLevel::Info => "info",
            ConsoleLevel::Warn => "warn",
            ConsoleLevel::Error => "error",
            ConsoleLevel::Debug => "debug",
        }
    }
}

/// The host's console capability.
pub trait ConsoleSink: Send + Sync {
    fn write(&self, level: ConsoleLevel, args: &[Value]);

    fn log(&self, args: &[Value]) {
        self.write(ConsoleLevel::Log, args)
    }

    fn info(&self, args: &[Value]) {
        self.write(ConsoleLevel::Info, args)
    }

    fn warn(&self, args: &[Value]) {
        self.write(ConsoleLevel::Warn, args)
    }

    fn error(&self, args: &[Value]) {
        self.write(ConsoleLevel::Error, args)
    }

    fn debug(&self, args: &[Value]) {
        self.write(ConsoleLevel::Debug, args)
    }
}

/// Console wrapper that tees writes into the session buffer.
pub struct RecordingConsole {
    inner: Arc<dyn ConsoleSink>,
    gate: RecordingGate,
    buffer: Arc<SessionBuffer>,
    location: Arc<dyn LocationSource>,
}

impl RecordingConsole {
    pub(crate) fn new(
        inner: Arc<dyn ConsoleSink>,
        gate: RecordingGate,
        buffer: Arc<SessionBuffer>,
        location: Arc<dyn LocationSource>,
    ) -> Self {
        Self {
            inner,
            gate,
            buffer,
            location,
        }
    }
}

impl ConsoleSink for RecordingConsole {
    fn write(&self, level: ConsoleLevel, args: &[Value]) {
        self.inner.write(level, args);

        if !self.gate.is_active() {
            return;
        }

        let message = args
            .iter()
            .map(stringify_arg)
            .collect::<Vec<_>>()
            .join(" ");
        self.buffer.append_log(LogEntry::new(
            format!("console.{}", level.as_str()),
            self.location.current_url(),
            json!({ "level": level.as_str(), "message": message }),
        ));
    }
}

/// Stringify one console argument independently of the others. Strings
/// pass through as-is; everything else is JSON-serialized, falling back
/// to the value's display form.
fn stringify_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| other.to_string()),
    }
}
