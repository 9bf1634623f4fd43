//! Session facade
//!
//! Wires the store, buffer, controller, interceptor registry, and
//! collector together in the order a page load needs: read persisted
//! state, install wrappers (always, regardless of state), then let the
//! host call `resume()` to pick up a recording interrupted by the
//! reload.

use crate::buffer::SessionBuffer;
use crate::config::RecorderConfig;
use crate::controller::{RecordingController, RecordingState};
use crate::error::RetraceResult;
use crate::intercept::{
    BlockingHttpTransport, ConsoleSink, FaultHandler, HttpTransport, InstrumentKit,
    InstrumentationRegistry, Instrumented,
};
use crate::recorder::StructuralRecorder;
use crate::store;
use crate::transport::{Collector, DeliveryResult, HttpCollector};
use std::sync::Arc;

/// One browsing session's recording machinery.
pub struct RecorderSession {
    controller: RecordingController,
    registry: InstrumentationRegistry,
    instruments: Instrumented,
}

impl RecorderSession {
    /// Initialize against the default HTTP collector from the config.
    pub fn initialize(
        config: RecorderConfig,
        kit: InstrumentKit,
        recorder: Option<Arc<dyn StructuralRecorder>>,
    ) -> RetraceResult<Self> {
        let collector = Arc::new(HttpCollector::new(config.collector_url.clone()));
        Self::initialize_with_collector(config, kit, recorder, collector)
    }

    /// Initialize with a caller-provided collector.
    pub fn initialize_with_collector(
        config: RecorderConfig,
        kit: InstrumentKit,
        recorder: Option<Arc<dyn StructuralRecorder>>,
        collector: Arc<dyn Collector>,
    ) -> RetraceResult<Self> {
        let store = store::open_store(config.store_path.as_deref())?;
        let buffer = Arc::new(SessionBuffer::new(store.clone()));

        let controller = RecordingController::new(
            store,
            buffer.clone(),
            recorder,
            collector,
            config.environment.clone(),
        )
        .with_record_log(config.record_recorder_log)
        .with_plugins(config.recorder_plugins.clone());

        let registry = InstrumentationRegistry::new();
        let instruments = registry.install(kit, controller.gate(), buffer);

        Ok(Self {
            controller,
            registry,
            instruments,
        })
    }

    /// Pick up a recording interrupted by a reload, if there was one.
    pub fn resume(&self) -> RetraceResult<bool> {
        self.controller.resume()
    }

    pub fn start(&self) -> RetraceResult<()> {
        self.controller.start()
    }

    pub fn stop(&self) -> bool {
        self.controller.stop()
    }

    pub async fn flush(&self) -> DeliveryResult {
        self.controller.flush().await
    }

    pub async fn stop_and_flush(&self) -> DeliveryResult {
        self.controller.stop_and_flush().await
    }

    pub fn is_recording(&self) -> bool {
        self.controller.is_recording()
    }

    pub fn state(&self) -> RecordingState {
        self.controller.state()
    }

    pub fn controller(&self) -> &RecordingController {
        &self.controller
    }

    /// Snapshot of the buffered structural events.
    pub fn events(&self) -> Vec<crate::types::StructuralEvent> {
        self.controller.events()
    }

    /// Snapshot of the buffered log entries.
    pub fn logs(&self) -> Vec<crate::types::LogEntry> {
        self.controller.logs()
    }

    /// The install-once guard for this session's wrappers.
    pub fn registry(&self) -> &InstrumentationRegistry {
        &self.registry
    }

    /// The wrapped console the host should write through.
    pub fn console(&self) -> Arc<dyn ConsoleSink> {
        self.instruments.console.clone()
    }

    /// The wrapped async transport the host should send through.
    pub fn http(&self) -> Arc<dyn HttpTransport> {
        self.instruments.http.clone()
    }

    /// The wrapped blocking transport, when the host supplied one.
    pub fn blocking_http(&self) -> Option<Arc<dyn BlockingHttpTransport>> {
        self.instruments.blocking_http.clone()
    }

    /// The wrapped fault handler the host should report through.
    pub fn faults(&self) -> Arc<dyn FaultHandler> {
        self.instruments.faults.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intercept::{ConsoleLevel, HttpRequest, HttpResponse, StaticLocation};
    use crate::recorder::{RecordOptions, RecorderHandle};
    use crate::transport::DeliveryResult;
    use crate::types::SessionBundle;
    use async_trait::async_trait;
    use serde_json::Value;

    struct NullConsole;
    impl ConsoleSink for NullConsole {
        fn write(&self, _level: ConsoleLevel, _args: &[Value]) {}
    }

    struct NullTransport;
    #[async_trait]
    impl HttpTransport for NullTransport {
        async fn send(&self, _request: HttpRequest) -> RetraceResult<HttpResponse> {
            Ok(HttpResponse::new(200))
        }
    }

    struct NullRecorder;
    impl StructuralRecorder for NullRecorder {
        fn start(&self, _options: RecordOptions) -> RetraceResult<RecorderHandle> {
            Ok(RecorderHandle::new(|| {}))
        }
    }

    struct NullCollector;
    #[async_trait]
    impl Collector for NullCollector {
        async fn deliver(&self, _bundle: &SessionBundle) -> DeliveryResult {
            DeliveryResult::Delivered
        }
    }

    fn kit() -> InstrumentKit {
        InstrumentKit {
            console: Arc::new(NullConsole),
            http: Arc::new(NullTransport),
            blocking_http: None,
            client: None,
            faults: None,
            location: Arc::new(StaticLocation::new("/page")),
        }
    }

    fn session() -> RecorderSession {
        let config = RecorderConfig::builder("http://localhost:3000/save-events")
            .build()
            .unwrap();
        RecorderSession::initialize_with_collector(
            config,
            kit(),
            Some(Arc::new(NullRecorder)),
            Arc::new(NullCollector),
        )
        .unwrap()
    }

    #[test]
    fn test_initialize_installs_wrappers_idle() {
        let session = session();
        assert!(session.registry().is_installed());
        assert_eq!(session.state(), RecordingState::Idle);
        assert!(session.blocking_http().is_none());
    }

    #[tokio::test]
    async fn test_console_writes_flow_into_the_session() {
        let session = session();
        session.start().unwrap();

        session.console().error(&[serde_json::json!({"a": 1})]);
        let logs = session.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].kind, "console.error");

        assert!(session.stop_and_flush().await.is_delivered());
        assert!(!session.is_recording());
    }
}
