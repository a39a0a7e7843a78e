//! Session recording
//!
//! Keeps the ordered log of calibrated step events for the active session and
//! feeds each event straight into the minute aggregator, so no second pass is
//! needed when the session ends.

use crate::aggregator::MinuteAggregator;
use crate::types::{MinuteRecord, StepEvent};

/// Accumulates calibrated `(relative timestamp, delta)` events for one session.
#[derive(Debug, Clone, Default)]
pub struct SessionRecorder {
    events: Vec<StepEvent>,
    aggregator: MinuteAggregator,
    total_steps: u64,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one calibrated step event. Events must arrive in non-decreasing
    /// `relative_ms` order, which the event source guarantees.
    pub fn record(&mut self, relative_ms: u64, delta: u64) {
        self.events.push(StepEvent { relative_ms, delta });
        self.total_steps += delta;
        self.aggregator.add(relative_ms, delta);
    }

    /// Running total of all recorded deltas.
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Events recorded so far.
    pub fn events(&self) -> &[StepEvent] {
        &self.events
    }

    /// Close the session: flush the aggregator and return the sparse
    /// per-minute records.
    pub fn finish(self) -> Vec<MinuteRecord> {
        self.aggregator.finish()
    }
}
