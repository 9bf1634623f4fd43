//! Log/event buffer
//!
//! Two append-only in-memory sequences mirrored to the session store on
//! every append. Losing an unexpected unload costs at most the in-flight
//! append, never the session. Storage failures are logged and swallowed;
//! telemetry loss is preferred over breaking the host.

use crate::store::SessionStore;
use crate::types::{LogEntry, StructuralEvent};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Store keys
pub const RECORDING_FLAG_KEY: &str = "retrace.recording";
pub const EVENTS_KEY: &str = "retrace.events";
pub const LOGS_KEY: &str = "retrace.logs";

/// Most recent log entries retained; oldest dropped first.
pub const LOG_CAP: usize = 10_000;
/// Most recent structural events retained; oldest dropped first.
pub const EVENT_CAP: usize = 50_000;

#[derive(Default)]
struct Buffers {
    events: VecDeque<StructuralEvent>,
    logs: VecDeque<LogEntry>,
}

/// Buffered telemetry for one recording session, write-through mirrored
/// to the session store.
pub struct SessionBuffer {
    store: Arc<dyn SessionStore>,
    inner: Mutex<Buffers>,
}

impl SessionBuffer {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            inner: Mutex::new(Buffers::default()),
        }
    }

    /// Append a structural event and mirror the full sequence.
    pub fn append_event(&self, event: StructuralEvent) {
        if let Ok(mut buffers) = self.inner.lock() {
            buffers.events.push_back(event);
            while buffers.events.len() > EVENT_CAP {
                buffers.events.pop_front();
            }
            self.persist(EVENTS_KEY, &buffers.events);
        }
    }

    /// Append a log entry and mirror the full sequence.
    pub fn append_log(&self, entry: LogEntry) {
        if let Ok(mut buffers) = self.inner.lock() {
            buffers.logs.push_back(entry);
            while buffers.logs.len() > LOG_CAP {
                buffers.logs.pop_front();
            }
            self.persist(LOGS_KEY, &buffers.logs);
        }
    }

    /// Replace the in-memory sequences with whatever the store holds.
    ///
    /// Missing or corrupt data falls back to empty sequences.
    pub fn load_from_store(&self) {
        let events = self.load_sequence(EVENTS_KEY);
        let logs = self.load_sequence(LOGS_KEY);
        if let Ok(mut buffers) = self.inner.lock() {
            buffers.events = events;
            buffers.logs = logs;
        }
    }

    /// Empty both sequences and remove all session keys from the store.
    pub fn clear(&self) {
        if let Ok(mut buffers) = self.inner.lock() {
            buffers.events.clear();
            buffers.logs.clear();
        }
        for key in [EVENTS_KEY, LOGS_KEY, RECORDING_FLAG_KEY] {
            if let Err(e) = self.store.delete(key) {
                tracing::warn!(key, error = %e, "failed to clear session store key");
            }
        }
    }

    /// Snapshot of the event sequence in emission order.
    pub fn events(&self) -> Vec<StructuralEvent> {
        self.inner
            .lock()
            .map(|b| b.events.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of the log sequence in append order.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.inner
            .lock()
            .map(|b| b.logs.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn event_count(&self) -> usize {
        self.inner.lock().map(|b| b.events.len()).unwrap_or(0)
    }

    pub fn log_count(&self) -> usize {
        self.inner.lock().map(|b| b.logs.len()).unwrap_or(0)
    }

    fn persist<T: Serialize>(&self, key: &str, sequence: &VecDeque<T>) {
        match serde_json::to_string(sequence) {
            Ok(raw) => {
                if let Err(e) = self.store.put(key, &raw) {
                    tracing::warn!(key, error = %e, "failed to mirror buffer to session store");
                }
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to serialize buffer");
            }
        }
    }

    fn load_sequence<T: DeserializeOwned>(&self, key: &str) -> VecDeque<T> {
        let raw = match self.store.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return VecDeque::new(),
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read buffer from session store");
                return VecDeque::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(sequence) => sequence,
            Err(e) => {
                tracing::warn!(key, error = %e, "discarding corrupt buffered sequence");
                VecDeque::new()
            }
        }
    }
}
