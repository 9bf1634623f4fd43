//! Durable session-scoped key/value storage
//!
//! The store mirrors the recording flag and both telemetry sequences so a
//! session survives a full reload. Backends: a single-file JSON store and
//! an in-memory store.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileSessionStore;
pub use memory::MemorySessionStore;
pub use traits::SessionStore;

use crate::error::RetraceResult;
use std::path::Path;
use std::sync::Arc;

/// Open the store backend for a session: file-backed when a path is
/// configured, in-memory otherwise.
pub fn open_store(path: Option<&Path>) -> RetraceResult<Arc<dyn SessionStore>> {
    match path {
        Some(path) => Ok(Arc::new(FileSessionStore::open(path)?)),
        None => Ok(Arc::new(MemorySessionStore::new())),
    }
}
