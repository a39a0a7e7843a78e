//! Call state machine
//!
//! Drives the session lifecycle from telephony state transitions and owns the
//! active session while a call is ongoing. All mutable tracking state lives in
//! one owned struct and is changed only through the explicit event-handling
//! functions below, so there is exactly one writer.
//!
//! Lifecycle:
//! - `Ringing` remembers that the next call is incoming (ignored while a call
//!   is already active; call waiting is not supported).
//! - `OffHook` starts a session unless one is already active. A duplicate
//!   off-hook notification never restarts or resets the session.
//! - `Idle` ends the active session synchronously: the aggregator is flushed
//!   and the session handed out before the function returns, so no later
//!   sensor event can be attributed to the closed session. An `Idle` after a
//!   ring that was never answered creates no session at all.

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::calibrator::{CounterObservation, StepCounterCalibrator};
use crate::recorder::SessionRecorder;
use crate::types::{CallState, FinishedSession, PhoneEvent, PhoneEventKind, SensorReading};

/// Tracking state for the call currently in progress.
///
/// Created on the transition into `Active`, destroyed on the transition out
/// of it.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    started_at: DateTime<Utc>,
    incoming: bool,
    caller_id: Option<String>,
    calibrator: StepCounterCalibrator,
    recorder: SessionRecorder,
}

impl ActiveSession {
    fn new(started_at: DateTime<Utc>, incoming: bool, caller_id: Option<String>) -> Self {
        Self {
            started_at,
            incoming,
            caller_id,
            calibrator: StepCounterCalibrator::new(),
            recorder: SessionRecorder::new(),
        }
    }

    fn finish(self, ended_at: DateTime<Utc>) -> FinishedSession {
        FinishedSession {
            started_at: self.started_at,
            ended_at,
            incoming: self.incoming,
            caller_id: self.caller_id,
            step_count: self.recorder.total_steps(),
            minutes: self.recorder.finish(),
        }
    }
}

/// Outcome of handling one telephony event.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// No session was started or ended.
    None,
    /// A tracking session began.
    Started { at: DateTime<Utc>, incoming: bool },
    /// The active session ended and is ready for finalization.
    Ended(FinishedSession),
}

/// Live step count update produced by a sensor reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepUpdate {
    /// Steps added by this reading
    pub delta: u64,
    /// Total steps of the session so far
    pub total_steps: u64,
}

/// The call-session tracking state machine.
#[derive(Debug, Default)]
pub struct CallStateMachine {
    state: CallState,
    incoming: bool,
    session: Option<ActiveSession>,
}

impl CallStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current call state.
    pub fn state(&self) -> CallState {
        self.state
    }

    /// Whether a session is currently being tracked.
    pub fn is_tracking(&self) -> bool {
        self.session.is_some()
    }

    /// Handle one telephony event.
    ///
    /// `keep_caller_id` reflects the host's "store phone numbers" setting; a
    /// caller identifier is only attached to the session when it is true.
    pub fn handle_event(&mut self, event: PhoneEvent, keep_caller_id: bool) -> Transition {
        match event.kind {
            PhoneEventKind::Ringing { .. } => {
                if self.state == CallState::Active {
                    // already on a call, a second ring is not tracked
                    debug!("ring while a call is active, ignoring");
                } else {
                    self.incoming = true;
                    self.state = CallState::Ringing;
                }
                Transition::None
            }
            PhoneEventKind::OffHook { caller_id } => {
                if self.state == CallState::Active {
                    debug!("duplicate off-hook notification, session keeps running");
                    return Transition::None;
                }

                let incoming = self.incoming;
                let caller_id = if keep_caller_id { caller_id } else { None };
                self.session = Some(ActiveSession::new(event.at, incoming, caller_id));
                self.state = CallState::Active;
                debug!("call off-hook at {}, incoming: {}", event.at, incoming);
                Transition::Started {
                    at: event.at,
                    incoming,
                }
            }
            PhoneEventKind::Idle => {
                self.state = CallState::Idle;
                self.incoming = false;
                match self.session.take() {
                    Some(session) => {
                        debug!("call ended at {}", event.at);
                        Transition::Ended(session.finish(event.at))
                    }
                    // a ring that was never answered, nothing to finalize
                    None => Transition::None,
                }
            }
        }
    }

    /// Handle one raw sensor reading.
    ///
    /// Readings are only consumed while a session is active; anything else is
    /// dropped. Returns a live update when the reading was a real measurement.
    pub fn handle_reading(&mut self, reading: &SensorReading) -> Option<StepUpdate> {
        let session = match self.session.as_mut() {
            Some(session) => session,
            None => {
                warn!("sensor reading outside of an active call, dropping");
                return None;
            }
        };

        match session.calibrator.observe(reading.counter) {
            CounterObservation::Step { delta, relative } => {
                let relative_ms = (reading.at - session.started_at)
                    .num_milliseconds()
                    .max(0) as u64;
                session.recorder.record(relative_ms, delta);
                debug!(
                    "{:>8}ms  counter {}  relative {}  delta {}",
                    relative_ms, reading.counter, relative, delta
                );
                Some(StepUpdate {
                    delta,
                    total_steps: session.recorder.total_steps(),
                })
            }
            CounterObservation::Baseline | CounterObservation::Duplicate => None,
            CounterObservation::Rebaselined => {
                warn!("step counter discontinuity mid-call, re-baselined");
                None
            }
        }
    }
}
