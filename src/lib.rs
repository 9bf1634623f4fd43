//! retrace: session telemetry recorder
//!
//! Captures structural events from an external recorder, tees console
//! and network activity through install-once wrappers, mirrors
//! everything to a durable session store so a reload can resume the
//! recording, and posts the finished bundle to a collector in one shot.
//!
//! The usual flow: build a [`RecorderConfig`], hand the host's
//! capabilities to [`RecorderSession::initialize`], call
//! [`RecorderSession::resume`] once at load time, and route the host's
//! console/network/fault traffic through the wrapped handles the
//! session returns.

pub mod buffer;
pub mod config;
pub mod controller;
pub mod error;
pub mod intercept;
pub mod recorder;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

pub use buffer::SessionBuffer;
pub use config::{RecorderConfig, RecorderConfigBuilder};
pub use controller::{RecordingController, RecordingGate, RecordingState};
pub use error::{RetraceError, RetraceResult};
pub use intercept::{InstrumentKit, InstrumentationRegistry, Instrumented};
pub use recorder::{RecordOptions, RecorderHandle, StructuralRecorder};
pub use session::RecorderSession;
pub use transport::{Collector, DeliveryResult, HttpCollector};
pub use types::{
    HostEnvironment, LogEntry, Resolution, SessionBundle, SessionMetadata, StructuralEvent,
};
