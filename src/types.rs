//! Core types for the callstride engine
//!
//! This module defines the data that flows through the engine: telephony and
//! sensor events on the way in, session and minute records on the way to the
//! store, and the dense minute series produced by reconstruction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier assigned to a persisted session by the store.
pub type SessionId = Uuid;

/// Phone call state as observed from the telephony source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallState {
    Idle,
    Ringing,
    Active,
}

impl Default for CallState {
    fn default() -> Self {
        CallState::Idle
    }
}

/// Telephony state change reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PhoneEventKind {
    /// An incoming call is ringing. Carries the caller identifier when the
    /// telephony source provides one.
    Ringing { caller_id: Option<String> },
    /// A call went off-hook (answered incoming call or dialing outgoing call).
    OffHook { caller_id: Option<String> },
    /// The line returned to idle.
    Idle,
}

/// A telephony event with the time it was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneEvent {
    /// When the state change was observed
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: PhoneEventKind,
}

/// One report from the cumulative hardware step counter.
///
/// The counter value is monotonic non-decreasing for the lifetime of the
/// sensor; it resets only on device reboot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorReading {
    /// When the reading was reported
    pub at: DateTime<Utc>,
    /// Cumulative step count since the counter last reset
    pub counter: u64,
}

/// Unified message type for the serialized event path.
///
/// Telephony and sensor callbacks arrive on independent host contexts; the
/// host queues them as `TrackerEvent`s and feeds them to
/// [`CallEngine::dispatch`](crate::engine::CallEngine::dispatch) one at a
/// time, in arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum TrackerEvent {
    Phone(PhoneEvent),
    Sensor(SensorReading),
}

/// A calibrated step event relative to the session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEvent {
    /// Milliseconds since the session started
    pub relative_ms: u64,
    /// Steps taken since the previous counter report
    pub delta: u64,
}

/// Steps counted within one minute of a call.
///
/// Minutes without any steps are never stored, so `steps` is always positive
/// and stored records have strictly increasing `minute` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinuteRecord {
    /// Zero-based minute index within the call
    pub minute: u32,
    /// Step count for that minute
    pub steps: u64,
}

/// Record of a finished call, as handed to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// When the call went off-hook
    pub started_at: DateTime<Utc>,
    /// Call duration in milliseconds
    pub duration_ms: u64,
    /// Total steps counted during the call
    pub step_count: u64,
    /// True for incoming calls, false for outgoing
    pub incoming: bool,
    /// Caller identifier, present only when the host allows storing it
    pub caller_id: Option<String>,
}

/// A completed tracking session on its way from the state machine to the
/// finalizer. Not yet persisted; the finalizer may still discard it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedSession {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub incoming: bool,
    pub caller_id: Option<String>,
    /// Sum of all calibrated step deltas of the session
    pub step_count: u64,
    /// Sparse per-minute totals, strictly increasing by minute
    pub minutes: Vec<MinuteRecord>,
}

/// Dense per-minute series reconstructed from sparse minute records.
///
/// Derived on demand for display and statistics, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MinuteSeries {
    /// One entry per call minute, zero-filled where no record existed
    pub minutes: Vec<u64>,
    /// Total of all per-minute values
    pub step_sum: u64,
    /// Smallest per-minute value, see [`reconstruct`](crate::reconstruct::reconstruct)
    /// for the exact (historical) semantics
    pub min_steps: u64,
    /// Largest single-minute value
    pub max_steps: u64,
    /// Truncated integer average of steps per minute
    pub avg_steps: u64,
}

impl MinuteSeries {
    /// Number of minutes in the series, `duration_ms / 60000 + 1`.
    pub fn minute_count(&self) -> usize {
        self.minutes.len()
    }
}
