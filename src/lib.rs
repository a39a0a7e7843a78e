//! Callstride - on-device engine for tracking step activity during phone calls
//!
//! Callstride watches phone-call state transitions and a cumulative hardware
//! step counter, counts the steps walked during each call, stores a sparse
//! per-minute profile, and rebuilds the dense minute series on demand for
//! display and statistics.
//!
//! ## Pipeline
//!
//! Live path: telephony events drive the [`tracker`] state machine; while a
//! call is active, raw counter readings pass through the [`calibrator`] into
//! the [`recorder`]/[`aggregator`], and on hang-up the [`finalizer`] decides
//! whether the session is persisted through the host's [`store`].
//!
//! Read path: stored sparse minute records go through [`reconstruct`] to
//! become a dense, zero-filled series with summary statistics.
//!
//! The [`engine`] module ties both paths together behind one serialized
//! entry point.

pub mod aggregator;
pub mod calibrator;
pub mod engine;
pub mod error;
pub mod export;
pub mod finalizer;
pub mod host;
pub mod reconstruct;
pub mod recorder;
pub mod stats;
pub mod store;
pub mod tracker;
pub mod types;

pub use engine::CallEngine;
pub use error::TrackError;
pub use host::{
    NullSensorSource, NullSink, SensorSource, Settings, SignalSink, StaticSettings, TrackerSignal,
};
pub use reconstruct::reconstruct;
pub use store::{MemoryStore, SessionStore};
pub use types::{
    CallState, MinuteRecord, MinuteSeries, PhoneEvent, PhoneEventKind, SensorReading, SessionId,
    SessionRecord, TrackerEvent,
};

/// Engine version, embedded in CLI output
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
