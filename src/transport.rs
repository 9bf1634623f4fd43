//! Transport adapter
//!
//! Serializes the finished session bundle and posts it to the collector
//! in a single request. No retry lives here: a failed delivery leaves the
//! buffers and the store untouched for a later manual attempt.

use crate::types::SessionBundle;
use async_trait::async_trait;
use url::Url;

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    Delivered,
    Failed { reason: String },
}

impl DeliveryResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryResult::Delivered)
    }
}

/// Destination for finished session bundles.
#[async_trait]
pub trait Collector: Send + Sync {
    /// Attempt to deliver the bundle once. Failure is a value, not an
    /// error: the caller decides what to keep.
    async fn deliver(&self, bundle: &SessionBundle) -> DeliveryResult;
}

/// Collector speaking JSON-over-HTTP, `POST <endpoint>`.
///
/// Any 2xx response acknowledges delivery; every other status and any
/// network failure is reported as `Failed`.
pub struct HttpCollector {
    endpoint: Url,
    client: reqwest::Client,
}

impl HttpCollector {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Collector for HttpCollector {
    async fn deliver(&self, bundle: &SessionBundle) -> DeliveryResult {
        match self
            .client
            .post(self.endpoint.clone())
            .json(bundle)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => DeliveryResult::Delivered,
            Ok(response) => DeliveryResult::Failed {
                reason: format!("collector returned {}", response.status()),
            },
            Err(e) => DeliveryResult::Failed {
                reason: e.to_string(),
            },
        }
    }
}
