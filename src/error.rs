use thiserror::Error;

/// Central error type for the retrace crate
#[derive(Error, Debug)]
pub enum RetraceError {
    // ============================================================================
    // Recording Errors
    // ============================================================================
    #[error("Structural recorder is not available")]
    RecorderUnavailable,

    #[error("Failed to start recording: {0}")]
    RecordingStartFailed(String),

    // ============================================================================
    // Storage Errors
    // ============================================================================
    #[error("Failed to save to session store: {0}")]
    StorageSaveFailed(String),

    #[error("Failed to load from session store: {0}")]
    StorageLoadFailed(String),

    // ============================================================================
    // Network Errors
    // ============================================================================
    #[error("Request failed: {0}")]
    RequestFailed(String),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ============================================================================
    // Generic/System Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mutex lock error")]
    LockError,
}

// Implement conversion from PoisonError for Mutex locks
impl<T> From<std::sync::PoisonError<T>> for RetraceError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        RetraceError::LockError
    }
}

impl From<url::ParseError> for RetraceError {
    fn from(err: url::ParseError) -> Self {
        RetraceError::InvalidConfig(err.to_string())
    }
}

// Helper type alias for Results
pub type RetraceResult<T> = Result<T, RetraceError>;
