//! Host integration points
//!
//! Settings the host exposes to the engine, and the fire-and-forget signals
//! the engine raises back (the host turns these into UI refreshes or
//! notifications; presentation is not the engine's concern).

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{SessionId, SessionRecord};

/// Read-only view of the user-configurable settings the engine consults.
pub trait Settings {
    /// Keep sessions whose step count is zero. Defaults to off.
    fn store_empty_sessions(&self) -> bool {
        false
    }

    /// Attach caller identifiers to sessions. Defaults to off.
    fn store_phone_numbers(&self) -> bool {
        false
    }
}

/// Fixed settings, for hosts without live preferences and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSettings {
    pub store_empty_sessions: bool,
    pub store_phone_numbers: bool,
}

impl Settings for StaticSettings {
    fn store_empty_sessions(&self) -> bool {
        self.store_empty_sessions
    }

    fn store_phone_numbers(&self) -> bool {
        self.store_phone_numbers
    }
}

/// Control handle for the host's step sensor listener.
///
/// The engine starts consumption when a call goes off-hook and stops it when
/// the call leaves the active state, so the listener's lifetime is tied
/// explicitly to the session boundaries instead of being implied by framework
/// callbacks. `stop` is called before the ended session is finalized.
pub trait SensorSource {
    /// Begin delivering sensor readings.
    fn start(&mut self);

    /// Stop delivering sensor readings.
    fn stop(&mut self);
}

/// Sensor source that does nothing, for hosts that deliver readings
/// unconditionally and for tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSensorSource;

impl SensorSource for NullSensorSource {
    fn start(&mut self) {}

    fn stop(&mut self) {}
}

/// Signal raised by the engine for external consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "signal", rename_all = "snake_case")]
pub enum TrackerSignal {
    /// A tracking session began.
    SessionStarted { at: DateTime<Utc>, incoming: bool },
    /// Live step count of the ongoing call changed.
    StepCount { at: DateTime<Utc>, steps: u64 },
    /// A session was finalized and persisted.
    SessionSaved { id: SessionId, record: SessionRecord },
    /// A session ended without steps and was discarded.
    SessionDiscarded { duration_ms: u64 },
}

/// Receiver for [`TrackerSignal`]s. Signals are fire-and-forget; the sink
/// must not block the event path.
pub trait SignalSink {
    fn emit(&mut self, signal: TrackerSignal);
}

/// Sink that drops every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SignalSink for NullSink {
    fn emit(&mut self, _signal: TrackerSignal) {}
}

/// Collecting sink, mainly useful in tests.
impl SignalSink for Vec<TrackerSignal> {
    fn emit(&mut self, signal: TrackerSignal) {
        self.push(signal);
    }
}
