//! In-memory session store
//!
//! Lives exactly as long as the process, which matches the
//! cleared-when-the-session-ends lifetime of the durable store contract.
//! Also the backend of choice for tests.

use super::traits::SessionStore;
use crate::error::RetraceResult;
use std::collections::HashMap;
use std::sync::Mutex;

/// Session store backed by a plain in-memory map.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn put(&self, key: &str, value: &str) -> RetraceResult<()> {
        self.entries
            .lock()?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> RetraceResult<Option<String>> {
        Ok(self.entries.lock()?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> RetraceResult<()> {
        self.entries.lock()?.remove(key);
        Ok(())
    }
}
