//! Session store trait definition
//!
//! The store is a durable key/value mirror scoped to one session.
//! Different implementations can provide different storage backends.

use crate::error::RetraceResult;

/// Durable session-scoped key/value store.
///
/// Implementations must serialize each mutation as a whole-value write so
/// rapid successive appends cannot interleave into a corrupt entry.
pub trait SessionStore: Send + Sync {
    /// Store a value under a key, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> RetraceResult<()>;

    /// Load the value stored under a key.
    fn get(&self, key: &str) -> RetraceResult<Option<String>>;

    /// Remove a key and its value.
    fn delete(&self, key: &str) -> RetraceResult<()>;

    /// Check whether a key is present.
    fn has(&self, key: &str) -> RetraceResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
