//! Interceptor set
//!
//! One wrapper per intercepted capability, installed exactly once per
//! registry lifetime. Wrappers capture their original implementation at
//! install time and stay in place for the rest of the session; stopping
//! a recording merely turns the shared gate off, so nothing is ever
//! unwrapped.

pub mod client;
pub mod console;
pub mod fault;
pub mod http;

pub use client::{ClientMiddleware, HookedClient, Next, RecordingMiddleware};
pub use console::{ConsoleLevel, ConsoleSink, RecordingConsole};
pub use fault::{hook_panics, FaultEvent, FaultHandler, RecordingFaultHandler};
pub use http::{
    BlockingHttpTransport, HttpBody, HttpRequest, HttpResponse, HttpTransport,
    RecordingBlockingTransport, RecordingTransport, OPAQUE_BODY_TOKEN, SNIPPET_MAX,
};

use crate::buffer::SessionBuffer;
use crate::controller::RecordingGate;
use http::NetworkProbe;
use std::sync::{Arc, OnceLock};

/// Where the page currently is; stamped onto every log entry.
pub trait LocationSource: Send + Sync {
    fn current_url(&self) -> String;
}

/// Location that never changes, for hosts without navigation.
pub struct StaticLocation(String);

impl StaticLocation {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }
}

impl LocationSource for StaticLocation {
    fn current_url(&self) -> String {
        self.0.clone()
    }
}

/// The host capabilities to instrument. Optional fields are
/// feature-detected once at install time.
pub struct InstrumentKit {
    pub console: Arc<dyn ConsoleSink>,
    pub http: Arc<dyn HttpTransport>,
    pub blocking_http: Option<Arc<dyn BlockingHttpTransport>>,
    pub client: Option<Arc<dyn HookedClient>>,
    pub faults: Option<Arc<dyn FaultHandler>>,
    pub location: Arc<dyn LocationSource>,
}

/// The wrapped capability set the host uses from installation on.
#[derive(Clone)]
pub struct Instrumented {
    pub console: Arc<dyn ConsoleSink>,
    pub http: Arc<dyn HttpTransport>,
    pub blocking_http: Option<Arc<dyn BlockingHttpTransport>>,
    pub faults: Arc<dyn FaultHandler>,
}

/// Install-once guard for the interceptor set.
///
/// Installation happens regardless of recording state; the wrappers gate
/// on the shared flag. A second `install` warns and returns the set that
/// is already in place, so repeated controller start/stop cycles can
/// never re-wrap a capability.
pub struct InstrumentationRegistry {
    installed: OnceLock<Instrumented>,
}

impl InstrumentationRegistry {
    pub const fn new() -> Self {
        Self {
            installed: OnceLock::new(),
        }
    }

    pub fn is_installed(&self) -> bool {
        self.installed.get().is_some()
    }

    pub fn install(
        &self,
        kit: InstrumentKit,
        gate: RecordingGate,
        buffer: Arc<SessionBuffer>,
    ) -> Instrumented {
        let probe = |gate: &RecordingGate| {
            NetworkProbe::new(gate.clone(), buffer.clone(), kit.location.clone())
        };

        let instrumented = Instrumented {
            console: Arc::new(RecordingConsole::new(
                kit.console.clone(),
                gate.clone(),
                buffer.clone(),
                kit.location.clone(),
            )),
            http: Arc::new(RecordingTransport::new(kit.http.clone(), probe(&gate))),
            blocking_http: kit.blocking_http.clone().map(|inner| {
                Arc::new(RecordingBlockingTransport::new(inner, probe(&gate)))
                    as Arc<dyn BlockingHttpTransport>
            }),
            faults: Arc::new(RecordingFaultHandler::new(
                kit.faults.clone(),
                gate.clone(),
                buffer.clone(),
                kit.location.clone(),
            )),
        };

        if self.installed.set(instrumented.clone()).is_err() {
            tracing::warn!("interceptors already installed; keeping the existing set");
            if let Some(existing) = self.installed.get() {
                return existing.clone();
            }
            return instrumented;
        }

        // The hooked client mutates in place, so register only on the
        // winning install.
        if let Some(client) = &kit.client {
            client.register_middleware(Arc::new(RecordingMiddleware::new(probe(&gate))));
        }

        instrumented
    }
}

impl Default for InstrumentationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySessionStore;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NullConsole;
    impl ConsoleSink for NullConsole {
        fn write(&self, _level: ConsoleLevel, _args: &[Value]) {}
    }

    struct NullTransport;
    #[async_trait::async_trait]
    impl HttpTransport for NullTransport {
        async fn send(&self, _request: HttpRequest) -> crate::error::RetraceResult<HttpResponse> {
            Ok(HttpResponse::new(200))
        }
    }

    struct CountingClient {
        registrations: AtomicUsize,
    }
    impl HookedClient for CountingClient {
        fn register_middleware(&self, _middleware: Arc<dyn ClientMiddleware>) {
            self.registrations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn kit(client: Option<Arc<dyn HookedClient>>) -> InstrumentKit {
        InstrumentKit {
            console: Arc::new(NullConsole),
            http: Arc::new(NullTransport),
            blocking_http: None,
            client,
            faults: None,
            location: Arc::new(StaticLocation::new("/page")),
        }
    }

    #[test]
    fn test_install_is_idempotent() {
        let registry = InstrumentationRegistry::new();
        let gate = RecordingGate::new(false);
        let buffer = Arc::new(SessionBuffer::new(Arc::new(MemorySessionStore::new())));

        assert!(!registry.is_installed());
        let first = registry.install(kit(None), gate.clone(), buffer.clone());
        assert!(registry.is_installed());

        let second = registry.install(kit(None), gate, buffer);
        assert!(Arc::ptr_eq(&first.console, &second.console));
        assert!(Arc::ptr_eq(&first.http, &second.http));
    }

    #[test]
    fn test_hooked_client_registered_once() {
        let registry = InstrumentationRegistry::new();
        let gate = RecordingGate::new(false);
        let buffer = Arc::new(SessionBuffer::new(Arc::new(MemorySessionStore::new())));
        let client = Arc::new(CountingClient {
            registrations: AtomicUsize::new(0),
        });

        registry.install(kit(Some(client.clone())), gate.clone(), buffer.clone());
        registry.install(kit(Some(client.clone())), gate, buffer);

        assert_eq!(client.registrations.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_wrapped_console_gates_on_shared_flag() {
        let registry = InstrumentationRegistry::new();
        let gate = RecordingGate::new(false);
        let store = Arc::new(MemorySessionStore::new());
        let buffer = Arc::new(SessionBuffer::new(store));

        let instrumented = registry.install(kit(None), gate.clone(), buffer.clone());

        instrumented.console.log(&[Value::String("quiet".into())]);
        assert_eq!(buffer.log_count(), 0);

        // Flipping the gate activates the already-installed wrapper
        gate.set_active(true);
        instrumented.console.log(&[Value::String("captured".into())]);
        assert_eq!(buffer.log_count(), 1);

        gate.set_active(false);
        instrumented.console.log(&[Value::String("quiet again".into())]);
        assert_eq!(buffer.log_count(), 1);
    }
}
