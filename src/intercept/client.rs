//! Third-party HTTP client interception
//!
//! Some hosts route traffic through a client that exposes its own
//! middleware registration instead of a wrappable transport. When such a
//! client is present (detected once at install time), a recording
//! middleware is registered on it. The middleware forwards the request to
//! the continuation and returns its outcome unchanged.

use super::http::{HttpRequest, HttpResponse, NetworkProbe};
use crate::error::RetraceResult;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

/// Continuation invoking the rest of the client's middleware chain and
/// the underlying send.
pub struct Next<'a> {
    run: Box<dyn FnOnce(HttpRequest) -> BoxFuture<'a, RetraceResult<HttpResponse>> + Send + 'a>,
}

impl<'a> Next<'a> {
    pub fn new(
        run: impl FnOnce(HttpRequest) -> BoxFuture<'a, RetraceResult<HttpResponse>> + Send + 'a,
    ) -> Self {
        Self { run: Box::new(run) }
    }

    pub async fn run(self, request: HttpRequest) -> RetraceResult<HttpResponse> {
        (self.run)(request).await
    }
}

/// Middleware as the hooked client defines it.
#[async_trait]
pub trait ClientMiddleware: Send + Sync {
    async fn handle(&self, request: HttpRequest, next: Next<'_>) -> RetraceResult<HttpResponse>;
}

/// A client that accepts middleware registration. The capability is
/// resolved once at install time; absence simply skips registration.
pub trait HookedClient: Send + Sync {
    fn register_middleware(&self, middleware: Arc<dyn ClientMiddleware>);
}

/// The recording middleware registered on a present hooked client.
pub struct RecordingMiddleware {
    probe: NetworkProbe,
}

impl RecordingMiddleware {
    pub(crate) fn new(probe: NetworkProbe) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl ClientMiddleware for RecordingMiddleware {
    async fn handle(&self, request: HttpRequest, next: Next<'_>) -> RetraceResult<HttpResponse> {
        let span = self.probe.begin(&request);
        let outcome = next.run(request.clone()).await;
        self.probe.complete(&span, &request, &outcome);
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SessionBuffer;
    use crate::controller::RecordingGate;
    use crate::intercept::http::HttpBody;
    use crate::intercept::StaticLocation;
    use crate::store::MemorySessionStore;
    use crate::types::kinds;
    use std::sync::Mutex;

    /// Client double that runs a single registered middleware around a
    /// canned terminal response.
    struct FakeClient {
        middlewares: Mutex<Vec<Arc<dyn ClientMiddleware>>>,
    }

    impl FakeClient {
        fn new() -> Self {
            Self {
                middlewares: Mutex::new(Vec::new()),
            }
        }

        async fn execute(&self, request: HttpRequest) -> RetraceResult<HttpResponse> {
            let middleware = self.middlewares.lock().unwrap().first().cloned();
            match middleware {
                Some(middleware) => {
                    middleware
                        .handle(request, Next::new(|req| Box::pin(Self::terminal(req))))
                        .await
                }
                None => Self::terminal(request).await,
            }
        }

        async fn terminal(_request: HttpRequest) -> RetraceResult<HttpResponse> {
            Ok(HttpResponse::new(200).with_body(HttpBody::Text("client ok".to_string())))
        }
    }

    impl HookedClient for FakeClient {
        fn register_middleware(&self, middleware: Arc<dyn ClientMiddleware>) {
            self.middlewares.lock().unwrap().push(middleware);
        }
    }

    fn recording_middleware(active: bool) -> (Arc<SessionBuffer>, Arc<RecordingMiddleware>) {
        let buffer = Arc::new(SessionBuffer::new(Arc::new(MemorySessionStore::new())));
        let probe = NetworkProbe::new(
            RecordingGate::new(active),
            buffer.clone(),
            Arc::new(StaticLocation::new("/page")),
        );
        (buffer, Arc::new(RecordingMiddleware::new(probe)))
    }

    #[tokio::test]
    async fn test_registered_middleware_logs_request_and_response() {
        let client = FakeClient::new();
        let (buffer, middleware) = recording_middleware(true);
        client.register_middleware(middleware);

        let response = client.execute(HttpRequest::new("GET", "/api")).await.unwrap();
        assert_eq!(response.status, 200);

        let logs = buffer.logs();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].kind, kinds::NETWORK_REQUEST);
        assert_eq!(logs[1].kind, kinds::NETWORK_RESPONSE);
        assert_eq!(logs[1].data["response"], "client ok");
        assert_eq!(logs[0].data["correlationId"], logs[1].data["correlationId"]);
    }

    #[tokio::test]
    async fn test_middleware_is_transparent_when_inactive() {
        let client = FakeClient::new();
        let (buffer, middleware) = recording_middleware(false);
        client.register_middleware(middleware);

        let response = client.execute(HttpRequest::new("GET", "/api")).await.unwrap();
        assert_eq!(response.body, HttpBody::Text("client ok".to_string()));
        assert_eq!(buffer.log_count(), 0);
    }
}
