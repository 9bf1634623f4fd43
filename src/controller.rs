//! Recording controller
//!
//! Owns the {Idle, Recording} lifecycle: starting and stopping the
//! external recorder, persisting the recording flag across reloads, and
//! handing finished buffers to the collector. Interceptors never consult
//! the controller directly; they gate on the shared [`RecordingGate`].

use crate::buffer::{SessionBuffer, RECORDING_FLAG_KEY};
use crate::error::{RetraceError, RetraceResult};
use crate::recorder::{EmitFn, RecordOptions, RecorderHandle, StructuralRecorder};
use crate::store::SessionStore;
use crate::transport::{Collector, DeliveryResult};
use crate::types::{HostEnvironment, SessionBundle, SessionMetadata};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Lifecycle state of a recording session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
}

impl RecordingState {
    /// Parse the persisted flag. Anything but a literal `true` (absent,
    /// corrupt, whatever) is Idle.
    fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("true") => RecordingState::Recording,
            _ => RecordingState::Idle,
        }
    }

    fn as_flag(self) -> &'static str {
        match self {
            RecordingState::Recording => "true",
            RecordingState::Idle => "false",
        }
    }
}

/// Shared on/off flag every interceptor checks before logging.
///
/// Only the controller flips it; wrappers stay installed for the life of
/// the session and become inert the moment it reads false.
#[derive(Clone, Default)]
pub struct RecordingGate(Arc<AtomicBool>);

impl RecordingGate {
    pub fn new(active: bool) -> Self {
        Self(Arc::new(AtomicBool::new(active)))
    }

    pub fn is_active(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.0.store(active, Ordering::Relaxed);
    }
}

/// State machine driving one recording session.
pub struct RecordingController {
    store: Arc<dyn SessionStore>,
    buffer: Arc<SessionBuffer>,
    recorder: Option<Arc<dyn StructuralRecorder>>,
    collector: Arc<dyn Collector>,
    environment: HostEnvironment,
    session_id: Uuid,
    gate: RecordingGate,
    handle: Mutex<Option<RecorderHandle>>,
    record_log: bool,
    plugins: Vec<String>,
}

impl RecordingController {
    /// Build a controller, initializing state from the persisted flag
    /// (Idle when absent or unparseable).
    pub fn new(
        store: Arc<dyn SessionStore>,
        buffer: Arc<SessionBuffer>,
        recorder: Option<Arc<dyn StructuralRecorder>>,
        collector: Arc<dyn Collector>,
        environment: HostEnvironment,
    ) -> Self {
        let persisted = match store.get(RECORDING_FLAG_KEY) {
            Ok(flag) => flag,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read persisted recording flag");
                None
            }
        };
        let state = RecordingState::from_flag(persisted.as_deref());

        Self {
            store,
            buffer,
            recorder,
            collector,
            environment,
            session_id: Uuid::new_v4(),
            gate: RecordingGate::new(state == RecordingState::Recording),
            handle: Mutex::new(None),
            record_log: false,
            plugins: Vec::new(),
        }
    }

    /// Ask the recorder to also capture its own log stream.
    pub fn with_record_log(mut self, record_log: bool) -> Self {
        self.record_log = record_log;
        self
    }

    /// Opaque plugin identifiers forwarded to the recorder.
    pub fn with_plugins(mut self, plugins: Vec<String>) -> Self {
        self.plugins = plugins;
        self
    }

    /// The gate interceptors share with this controller.
    pub fn gate(&self) -> RecordingGate {
        self.gate.clone()
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Snapshot of the buffered structural events.
    pub fn events(&self) -> Vec<crate::types::StructuralEvent> {
        self.buffer.events()
    }

    /// Snapshot of the buffered log entries.
    pub fn logs(&self) -> Vec<crate::types::LogEntry> {
        self.buffer.logs()
    }

    pub fn is_recording(&self) -> bool {
        self.gate.is_active()
    }

    pub fn state(&self) -> RecordingState {
        if self.is_recording() {
            RecordingState::Recording
        } else {
            RecordingState::Idle
        }
    }

    /// Begin recording.
    ///
    /// A live recording makes this a warned no-op. A missing recorder
    /// aborts with [`RetraceError::RecorderUnavailable`] and leaves state
    /// untouched. Previously persisted buffers are loaded first, so a
    /// start after a reload continues the stored session.
    pub fn start(&self) -> RetraceResult<()> {
        let mut handle = self.handle.lock()?;
        if handle.is_some() {
            tracing::warn!("start ignored: recording already in progress");
            return Ok(());
        }

        self.buffer.load_from_store();

        let recorder = self
            .recorder
            .as_ref()
            .ok_or(RetraceError::RecorderUnavailable)?;

        let buffer = self.buffer.clone();
        let emit: EmitFn = Arc::new(move |event| buffer.append_event(event));
        let mut options = RecordOptions::new(emit);
        options.record_log = self.record_log;
        options.plugins = self.plugins.clone();

        *handle = Some(recorder.start(options)?);
        self.gate.set_active(true);
        self.persist_flag(RecordingState::Recording);
        Ok(())
    }

    /// End recording, keeping wrappers installed but inert.
    ///
    /// Returns whether a recording was actually stopped; stopping while
    /// Idle is a warned no-op.
    pub fn stop(&self) -> bool {
        if !self.gate.is_active() {
            tracing::warn!("stop ignored: no recording in progress");
            return false;
        }

        if let Ok(mut handle) = self.handle.lock() {
            if let Some(live) = handle.take() {
                live.stop();
            }
        }

        self.gate.set_active(false);
        self.persist_flag(RecordingState::Idle);
        true
    }

    /// Hand the buffered session to the collector.
    ///
    /// Buffers and store are cleared only on acknowledged delivery; a
    /// failure leaves everything in place for a later attempt.
    pub async fn flush(&self) -> DeliveryResult {
        let bundle = SessionBundle {
            events: self.buffer.events(),
            logs: self.buffer.logs(),
            session_info: SessionMetadata::capture(self.session_id, &self.environment),
        };

        let result = self.collector.deliver(&bundle).await;
        match &result {
            DeliveryResult::Delivered => self.buffer.clear(),
            DeliveryResult::Failed { reason } => {
                tracing::warn!(reason = %reason, "session upload failed; buffers retained");
            }
        }
        result
    }

    /// `stop()` followed by `flush()`. The stop half no-ops on repeat
    /// calls, so retrying after a failed upload re-attempts delivery of
    /// the same data.
    pub async fn stop_and_flush(&self) -> DeliveryResult {
        self.stop();
        self.flush().await
    }

    /// Reconcile persisted state at load time.
    ///
    /// When the store says Recording and no live handle exists (a fresh
    /// process never has one), recording is re-established against the
    /// current page with all buffered data preserved. Returns whether a
    /// resume occurred.
    pub fn resume(&self) -> RetraceResult<bool> {
        let live = self.handle.lock()?.is_some();
        if live || !self.gate.is_active() {
            return Ok(false);
        }
        self.start()?;
        Ok(true)
    }

    fn persist_flag(&self, state: RecordingState) {
        if let Err(e) = self.store.put(RECORDING_FLAG_KEY, state.as_flag()) {
            tracing::warn!(error = %e, "failed to persist recording flag");
        }
    }
}
