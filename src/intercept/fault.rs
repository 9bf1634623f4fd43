//! Error and rejection interception
//!
//! The fault wrapper tees uncaught errors and unhandled rejections into
//! the session buffer and then forwards unconditionally to the host's
//! own handler; it has no way to suppress the event or change default
//! reporting. An opt-in process panic hook feeds panics through the same
//! path while chaining the previously installed hook.

use super::LocationSource;
use crate::buffer::SessionBuffer;
use crate::controller::RecordingGate;
use crate::types::{kinds, LogEntry};
use serde_json::json;
use std::sync::{Arc, Once};

/// One uncaught error or unhandled rejection as reported by the host.
#[derive(Debug, Clone)]
pub struct FaultEvent {
    pub message: String,
    pub source: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

impl FaultEvent {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
            line: None,
            column: None,
        }
    }
}

/// The host's fault reporting capability.
pub trait FaultHandler: Send + Sync {
    fn on_error(&self, fault: &FaultEvent);
    fn on_unhandled_rejection(&self, fault: &FaultEvent);
}

/// Fault wrapper that logs and always forwards.
pub struct RecordingFaultHandler {
    inner: Option<Arc<dyn FaultHandler>>,
    gate: RecordingGate,
    buffer: Arc<SessionBuffer>,
    location: Arc<dyn LocationSource>,
}

impl RecordingFaultHandler {
    pub(crate) fn new(
        inner: Option<Arc<dyn FaultHandler>>,
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

    fn record(&self, kind: &str, fault: &FaultEvent) {
        if !self.gate.is_active() {
            return;
        }
        self.buffer.append_log(LogEntry::new(
            kind,
            self.location.current_url(),
            json!({
                "message": fault.message,
                "source": fault.source,
                "line": fault.line,
                "column": fault.column,
            }),
        ));
    }
}

impl FaultHandler for RecordingFaultHandler {
    fn on_error(&self, fault: &FaultEvent) {
        self.record(kinds::ERROR, fault);
        if let Some(inner) = &self.inner {
            inner.on_error(fault);
        }
    }

    fn on_unhandled_rejection(&self, fault: &FaultEvent) {
        self.record(kinds::UNHANDLED_REJECTION, fault);
        if let Some(inner) = &self.inner {
            inner.on_unhandled_rejection(fault);
        }
    }
}

static PANIC_HOOK: Once = Once::new();

/// Route process panics through the given handler as error faults.
///
/// The previously installed hook keeps running afterwards, so default
/// panic reporting is unchanged. Installed at most once per process.
pub fn hook_panics(handler: Arc<dyn FaultHandler>) {
    PANIC_HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = info.payload().downcast_ref::<String>() {
                s.clone()
            } else {
                "panic".to_string()
            };

            let mut fault = FaultEvent::message(message);
            if let Some(location) = info.location() {
                fault.source = Some(location.file().to_string());
                fault.line = Some(location.line());
                fault.column = Some(location.column());
            }

            handler.on_error(&fault);
            previous(info);
        }));
    });
}
