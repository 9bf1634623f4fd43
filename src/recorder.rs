//! External structural recorder boundary
//!
//! The recorder is a collaborator: it produces an opaque event stream and
//! hands back a stop handle. Its absence is detectable and must not take
//! the host down.

use crate::error::RetraceResult;
use crate::types::StructuralEvent;
use std::sync::Arc;

/// Callback the recorder invokes for every emitted event.
pub type EmitFn = Arc<dyn Fn(StructuralEvent) + Send + Sync>;

/// Options handed to the recorder at start time.
#[derive(Clone)]
pub struct RecordOptions {
    /// Receives each structural event in emission order.
    pub emit: EmitFn,
    /// Whether the recorder should capture its own log stream.
    pub record_log: bool,
    /// Opaque plugin identifiers passed through to the recorder.
    pub plugins: Vec<String>,
}

impl RecordOptions {
    pub fn new(emit: EmitFn) -> Self {
        Self {
            emit,
            record_log: false,
            plugins: Vec::new(),
        }
    }
}

/// Contract consumed from the external structural recorder.
pub trait StructuralRecorder: Send + Sync {
    /// Begin recording against the current page, returning the handle
    /// that ends it.
    fn start(&self, options: RecordOptions) -> RetraceResult<RecorderHandle>;
}

/// Handle that stops an in-flight recording when invoked.
pub struct RecorderHandle {
    stop: Option<Box<dyn FnOnce() + Send>>,
}

impl RecorderHandle {
    pub fn new(stop: impl FnOnce() + Send + 'static) -> Self {
        Self {
            stop: Some(Box::new(stop)),
        }
    }

    /// End the recording. Consuming the handle makes a second stop
    /// unrepresentable.
    pub fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

impl std::fmt::Debug for RecorderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecorderHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct ScriptedRecorder {
        events: Vec<StructuralEvent>,
        stopped: Arc<AtomicBool>,
    }

    impl StructuralRecorder for ScriptedRecorder {
        fn start(&self, options: RecordOptions) -> RetraceResult<RecorderHandle> {
            for event in &self.events {
                (options.emit)(event.clone());
            }
            let stopped = self.stopped.clone();
            Ok(RecorderHandle::new(move || {
                stopped.store(true, Ordering::SeqCst);
            }))
        }
    }

    #[test]
    fn test_recorder_emits_through_callback() {
        let stopped = Arc::new(AtomicBool::new(false));
        let recorder = ScriptedRecorder {
            events: vec![
                StructuralEvent(json!({"seq": 1})),
                StructuralEvent(json!({"seq": 2})),
            ],
            stopped: stopped.clone(),
        };

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let handle = recorder
            .start(RecordOptions::new(Arc::new(move |event| {
                sink.lock().unwrap().push(event);
            })))
            .unwrap();

        assert_eq!(seen.lock().unwrap().len(), 2);
        assert!(!stopped.load(Ordering::SeqCst));

        handle.stop();
        assert!(stopped.load(Ordering::SeqCst));
    }
}
