//! Core data model: structural events, log entries, and the session bundle
//! handed to the collector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dot-namespaced log entry kinds.
pub mod kinds {
    pub const NETWORK_REQUEST: &str = "network.request";
    pub const NETWORK_RESPONSE: &str = "network.response";
    pub const NETWORK_ERROR: &str = "network.error";
    pub const ERROR: &str = "error";
    pub const UNHANDLED_REJECTION: &str = "unhandledRejection";
}

/// Opaque structural event emitted by the external recorder.
///
/// The recorder owns the shape; this layer only preserves emission order
/// and persists each event as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuralEvent(pub serde_json::Value);

impl From<serde_json::Value> for StructuralEvent {
    fn from(value: serde_json::Value) -> Self {
        StructuralEvent(value)
    }
}

/// One captured activity record from an interceptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Dot-namespaced kind, e.g. `console.error` or `network.request`.
    #[serde(rename = "type")]
    pub kind: String,

    /// Milliseconds since the Unix epoch at capture time.
    pub timestamp: i64,

    /// Page location at the time of capture.
    pub url: String,

    /// Kind-specific payload.
    pub data: serde_json::Value,
}

impl LogEntry {
    /// Create an entry stamped with the current wall clock.
    pub fn new(kind: impl Into<String>, url: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            timestamp: Utc::now().timestamp_millis(),
            url: url.into(),
            data,
        }
    }
}

/// Pixel dimensions of a screen or viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Static facts about the host the session runs in, supplied at
/// initialization and snapshotted into [`SessionMetadata`] at flush time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostEnvironment {
    pub user_agent: String,
    pub screen: Resolution,
    pub viewport: Resolution,
}

/// Session snapshot taken once at flush time. Never persisted
/// incrementally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub session_id: Uuid,
    pub user_agent: String,
    pub screen: Resolution,
    pub viewport: Resolution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    pub stopped_at: DateTime<Utc>,
}

impl SessionMetadata {
    /// Snapshot the host environment with a stop timestamp of now.
    pub fn capture(session_id: Uuid, environment: &HostEnvironment) -> Self {
        Self {
            session_id,
            user_agent: environment.user_agent.clone(),
            screen: environment.screen,
            viewport: environment.viewport,
            host: hostname::get().ok().and_then(|h| h.into_string().ok()),
            stopped_at: Utc::now(),
        }
    }
}

/// The unit handed to the transport adapter: both buffers plus the
/// metadata snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionBundle {
    pub events: Vec<StructuralEvent>,
    pub logs: Vec<LogEntry>,
    #[serde(rename = "sessionInfo")]
    pub session_info: SessionMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_log_entry_wire_shape() {
        let entry = LogEntry::new(kinds::NETWORK_REQUEST, "/page", json!({"method": "GET"}));
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["type"], "network.request");
        assert_eq!(value["url"], "/page");
        assert_eq!(value["data"]["method"], "GET");
        assert!(value["timestamp"].is_i64());
    }

    #[test]
    fn test_structural_event_is_transparent() {
        let event = StructuralEvent(json!({"kind": 2, "payload": {"x": 1}}));
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value, json!({"kind": 2, "payload": {"x": 1}}));

        let back: StructuralEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_bundle_uses_session_info_key() {
        let bundle = SessionBundle {
            events: vec![StructuralEvent(json!(1))],
            logs: vec![],
            session_info: SessionMetadata::capture(Uuid::new_v4(), &HostEnvironment::default()),
        };
        let value = serde_json::to_value(&bundle).unwrap();

        assert!(value.get("sessionInfo").is_some());
        assert!(value["sessionInfo"].get("userAgent").is_some());
        assert!(value["sessionInfo"].get("stoppedAt").is_some());
        assert_eq!(value["events"], json!([1]));
    }

    #[test]
    fn test_metadata_capture_stamps_now() {
        let before = Utc::now();
        let metadata = SessionMetadata::capture(Uuid::new_v4(), &HostEnvironment::default());
        assert!(metadata.stopped_at >= before);
        assert!(metadata.stopped_at <= Utc::now());
    }
}
