//! Session configuration
//!
//! Built once at initialization with a fluent builder; validation
//! happens in `build()` so a malformed collector URL is caught before
//! any recording starts.

use crate::error::{RetraceError, RetraceResult};
use crate::types::HostEnvironment;
use std::path::PathBuf;
use url::Url;

/// Configuration for one recording session.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Collector endpoint the finished bundle is posted to.
    pub collector_url: Url,
    /// File backing the session store; in-memory when absent.
    pub store_path: Option<PathBuf>,
    /// Host facts snapshotted into the session metadata at flush time.
    pub environment: HostEnvironment,
    /// Ask the external recorder to capture its own log stream as well.
    pub record_recorder_log: bool,
    /// Opaque plugin identifiers forwarded to the external recorder.
    pub recorder_plugins: Vec<String>,
}

impl RecorderConfig {
    pub fn builder(collector_url: impl Into<String>) -> RecorderConfigBuilder {
        RecorderConfigBuilder::new(collector_url)
    }
}

/// Builder for [`RecorderConfig`] with a fluent API.
pub struct RecorderConfigBuilder {
    collector_url: String,
    store_path: Option<PathBuf>,
    environment: HostEnvironment,
    record_recorder_log: bool,
    recorder_plugins: Vec<String>,
}

impl RecorderConfigBuilder {
    /// Create a new builder with the required collector URL.
    pub fn new(collector_url: impl Into<String>) -> Self {
        Self {
            collector_url: collector_url.into(),
            store_path: None,
            environment: HostEnvironment::default(),
            record_recorder_log: false,
            recorder_plugins: Vec::new(),
        }
    }

    /// Back the session store with a file at this path.
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    /// Set the host environment snapshot.
    pub fn environment(mut self, environment: HostEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// Let the external recorder capture its own log stream.
    pub fn record_recorder_log(mut self, record: bool) -> Self {
        self.record_recorder_log = record;
        self
    }

    /// Add a plugin identifier forwarded to the external recorder.
    pub fn recorder_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.recorder_plugins.push(plugin.into());
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    /// Returns `RetraceError::InvalidConfig` when the collector URL is
    /// missing, unparseable, or not http(s).
    pub fn build(self) -> RetraceResult<RecorderConfig> {
        if self.collector_url.trim().is_empty() {
            return Err(RetraceError::InvalidConfig(
                "collector URL is required".to_string(),
            ));
        }

        let collector_url = Url::parse(&self.collector_url)?;
        if !matches!(collector_url.scheme(), "http" | "https") {
            return Err(RetraceError::InvalidConfig(format!(
                "collector URL must be http(s), got {}",
                collector_url.scheme()
            )));
        }

        Ok(RecorderConfig {
            collector_url,
            store_path: self.store_path,
            environment: self.environment,
            record_recorder_log: self.record_recorder_log,
            recorder_plugins: self.recorder_plugins,
        })
    }
}
