//! Engine front door
//!
//! [`CallEngine`] wires the state machine, finalizer, store, settings and
//! signal sink together behind a single serialized entry point. Telephony and
//! sensor callbacks arrive on independent host contexts with no mutual
//! exclusion of their own, so the host queues them as [`TrackerEvent`]s and
//! calls [`CallEngine::dispatch`] one message at a time, in arrival order.
//! Nothing in here blocks or performs I/O beyond the store calls the
//! finalizer makes; store implementations are expected to hand data off to
//! their own worker.

use log::warn;

use crate::error::TrackError;
use crate::finalizer::{FinalizeOutcome, SessionFinalizer};
use crate::host::{
    NullSensorSource, NullSink, SensorSource, Settings, SignalSink, StaticSettings, TrackerSignal,
};
use crate::reconstruct::reconstruct;
use crate::store::SessionStore;
use crate::tracker::{CallStateMachine, Transition};
use crate::types::{CallState, MinuteSeries, PhoneEvent, SensorReading, SessionId, TrackerEvent};

/// Stateful engine tracking step activity across phone calls.
pub struct CallEngine<S: SessionStore> {
    machine: CallStateMachine,
    settings: Box<dyn Settings>,
    sink: Box<dyn SignalSink>,
    sensor: Box<dyn SensorSource>,
    store: S,
    has_step_sensor: bool,
}

impl<S: SessionStore> CallEngine<S> {
    /// Create an engine with default settings, no signal sink and a step
    /// sensor assumed present.
    pub fn new(store: S) -> Self {
        Self {
            machine: CallStateMachine::new(),
            settings: Box::new(StaticSettings::default()),
            sink: Box::new(NullSink),
            sensor: Box::new(NullSensorSource),
            store,
            has_step_sensor: true,
        }
    }

    /// Use the given settings source.
    pub fn with_settings(mut self, settings: impl Settings + 'static) -> Self {
        self.settings = Box::new(settings);
        self
    }

    /// Raise signals into the given sink.
    pub fn with_signal_sink(mut self, sink: impl SignalSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Start and stop the given sensor source at the session boundaries.
    pub fn with_sensor_source(mut self, sensor: impl SensorSource + 'static) -> Self {
        self.sensor = Box::new(sensor);
        self
    }

    /// Mark whether the device actually has a step counter sensor. Without
    /// one, call durations are still tracked but every session ends with a
    /// step count of zero.
    pub fn with_step_sensor(mut self, available: bool) -> Self {
        self.has_step_sensor = available;
        self
    }

    /// Whether a step counter sensor is available.
    pub fn has_step_sensor(&self) -> bool {
        self.has_step_sensor
    }

    /// Current call state.
    pub fn call_state(&self) -> CallState {
        self.machine.state()
    }

    /// Whether a session is currently being tracked.
    pub fn is_tracking(&self) -> bool {
        self.machine.is_tracking()
    }

    /// Access the underlying store (read path).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Process one queued event.
    pub fn dispatch(&mut self, event: TrackerEvent) -> Result<(), TrackError> {
        match event {
            TrackerEvent::Phone(event) => self.on_phone_event(event),
            TrackerEvent::Sensor(reading) => {
                self.on_sensor_reading(reading);
                Ok(())
            }
        }
    }

    /// Handle a telephony state change.
    ///
    /// Ending a call runs the finalizer synchronously; a store failure
    /// surfaces here and the session's data is lost, but the engine state is
    /// already back to idle and keeps working.
    pub fn on_phone_event(&mut self, event: PhoneEvent) -> Result<(), TrackError> {
        let keep_caller_id = self.settings.store_phone_numbers();
        match self.machine.handle_event(event, keep_caller_id) {
            Transition::None => Ok(()),
            Transition::Started { at, incoming } => {
                self.sensor.start();
                self.sink.emit(TrackerSignal::SessionStarted { at, incoming });
                Ok(())
            }
            Transition::Ended(finished) => {
                // unregister before finalizing; the session is already closed
                self.sensor.stop();
                let outcome =
                    SessionFinalizer::finalize(finished, self.settings.as_ref(), &mut self.store)?;
                match outcome {
                    FinalizeOutcome::Saved { id, record } => {
                        self.sink.emit(TrackerSignal::SessionSaved { id, record });
                    }
                    FinalizeOutcome::Discarded { duration_ms } => {
                        self.sink.emit(TrackerSignal::SessionDiscarded { duration_ms });
                    }
                }
                Ok(())
            }
        }
    }

    /// Handle a raw sensor reading.
    pub fn on_sensor_reading(&mut self, reading: SensorReading) {
        if !self.has_step_sensor {
            warn!("sensor reading received although no step sensor was detected");
        }
        if let Some(update) = self.machine.handle_reading(&reading) {
            self.sink.emit(TrackerSignal::StepCount {
                at: reading.at,
                steps: update.total_steps,
            });
        }
    }

    /// Rebuild the dense minute series of a stored session.
    pub fn reconstruct(&self, id: SessionId) -> Result<MinuteSeries, TrackError> {
        let record = self
            .store
            .load_session(id)?
            .ok_or(TrackError::UnknownSession(id))?;
        let minutes = self.store.load_minute_records(id)?;
        reconstruct(&minutes, record.duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{MinuteRecord, PhoneEventKind, SessionRecord};
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Sink sharing its signal log with the test.
    #[derive(Clone, Default)]
    struct SharedSink(Rc<RefCell<Vec<TrackerSignal>>>);

    impl SignalSink for SharedSink {
        fn emit(&mut self, signal: TrackerSignal) {
            self.0.borrow_mut().push(signal);
        }
    }

    fn at(offset_ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000 + offset_ms)
            .single()
            .unwrap()
    }

    fn phone(offset_ms: i64, kind: PhoneEventKind) -> TrackerEvent {
        TrackerEvent::Phone(PhoneEvent {
            at: at(offset_ms),
            kind,
        })
    }

    fn sensor(offset_ms: i64, counter: u64) -> TrackerEvent {
        TrackerEvent::Sensor(SensorReading {
            at: at(offset_ms),
            counter,
        })
    }

    fn ringing(offset_ms: i64) -> TrackerEvent {
        phone(
            offset_ms,
            PhoneEventKind::Ringing {
                caller_id: Some("+358401234567".into()),
            },
        )
    }

    fn off_hook(offset_ms: i64) -> TrackerEvent {
        phone(
            offset_ms,
            PhoneEventKind::OffHook {
                caller_id: Some("+358401234567".into()),
            },
        )
    }

    fn idle(offset_ms: i64) -> TrackerEvent {
        phone(offset_ms, PhoneEventKind::Idle)
    }

    #[test]
    fn test_full_call_round_trip() {
        let signals = SharedSink::default();
        let mut engine = CallEngine::new(MemoryStore::new()).with_signal_sink(signals.clone());

        engine.dispatch(ringing(0)).unwrap();
        engine.dispatch(off_hook(1_000)).unwrap();
        engine.dispatch(sensor(2_000, 4000)).unwrap(); // baseline
        engine.dispatch(sensor(10_000, 4005)).unwrap();
        engine.dispatch(sensor(70_000, 4005)).unwrap(); // duplicate
        engine.dispatch(sensor(121_000, 4015)).unwrap();
        engine.dispatch(idle(126_000)).unwrap();

        let sessions = engine.store().load_sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        let (id, record) = &sessions[0];
        assert_eq!(record.step_count, 15);
        assert_eq!(record.duration_ms, 125_000);
        assert!(record.incoming);
        // caller ids are not stored unless the setting allows it
        assert_eq!(record.caller_id, None);

        let series = engine.reconstruct(*id).unwrap();
        assert_eq!(series.minutes, vec![5, 0, 10]);
        assert_eq!(series.step_sum, 15);
        assert_eq!(series.avg_steps, 5);

        let log = signals.0.borrow();
        assert!(matches!(log[0], TrackerSignal::SessionStarted { incoming: true, .. }));
        assert!(matches!(log[1], TrackerSignal::StepCount { steps: 5, .. }));
        assert!(matches!(log[2], TrackerSignal::StepCount { steps: 15, .. }));
        assert!(matches!(log[3], TrackerSignal::SessionSaved { .. }));
    }

    #[test]
    fn test_empty_call_discarded_and_signalled() {
        let signals = SharedSink::default();
        let mut engine = CallEngine::new(MemoryStore::new()).with_signal_sink(signals.clone());

        engine.dispatch(off_hook(0)).unwrap();
        engine.dispatch(idle(30_000)).unwrap();

        assert_eq!(engine.store().session_count(), 0);
        let log = signals.0.borrow();
        assert!(matches!(
            log.last(),
            Some(TrackerSignal::SessionDiscarded { duration_ms: 30_000 })
        ));
    }

    #[test]
    fn test_empty_call_kept_with_setting() {
        let mut engine = CallEngine::new(MemoryStore::new()).with_settings(StaticSettings {
            store_empty_sessions: true,
            ..Default::default()
        });

        engine.dispatch(off_hook(0)).unwrap();
        engine.dispatch(idle(30_000)).unwrap();

        let sessions = engine.store().load_sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].1.step_count, 0);
        assert_eq!(sessions[0].1.duration_ms, 30_000);
    }

    #[test]
    fn test_caller_id_stored_with_setting() {
        let mut engine = CallEngine::new(MemoryStore::new()).with_settings(StaticSettings {
            store_phone_numbers: true,
            ..Default::default()
        });

        engine.dispatch(ringing(0)).unwrap();
        engine.dispatch(off_hook(1_000)).unwrap();
        engine.dispatch(sensor(2_000, 100)).unwrap();
        engine.dispatch(sensor(3_000, 103)).unwrap();
        engine.dispatch(idle(60_000)).unwrap();

        let sessions = engine.store().load_sessions().unwrap();
        assert_eq!(
            sessions[0].1.caller_id.as_deref(),
            Some("+358401234567")
        );
    }

    #[test]
    fn test_sensorless_device_still_tracks_duration() {
        let mut engine = CallEngine::new(MemoryStore::new())
            .with_step_sensor(false)
            .with_settings(StaticSettings {
                store_empty_sessions: true,
                ..Default::default()
            });
        assert!(!engine.has_step_sensor());

        engine.dispatch(off_hook(0)).unwrap();
        engine.dispatch(idle(95_000)).unwrap();

        let sessions = engine.store().load_sessions().unwrap();
        assert_eq!(sessions[0].1.step_count, 0);
        assert_eq!(sessions[0].1.duration_ms, 95_000);
    }

    #[test]
    fn test_late_sensor_events_do_not_touch_closed_session() {
        let mut engine = CallEngine::new(MemoryStore::new());

        engine.dispatch(off_hook(0)).unwrap();
        engine.dispatch(sensor(1_000, 100)).unwrap();
        engine.dispatch(sensor(2_000, 110)).unwrap();
        engine.dispatch(idle(60_000)).unwrap();
        // flush happened synchronously with the idle transition
        engine.dispatch(sensor(61_000, 140)).unwrap();

        let sessions = engine.store().load_sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].1.step_count, 10);
    }

    #[test]
    fn test_sensor_source_started_and_stopped_at_session_boundaries() {
        #[derive(Clone, Default)]
        struct SharedSource(Rc<RefCell<Vec<&'static str>>>);

        impl SensorSource for SharedSource {
            fn start(&mut self) {
                self.0.borrow_mut().push("start");
            }

            fn stop(&mut self) {
                self.0.borrow_mut().push("stop");
            }
        }

        let source = SharedSource::default();
        let mut engine = CallEngine::new(MemoryStore::new()).with_sensor_source(source.clone());

        // a ring that is never answered must not touch the sensor
        engine.dispatch(ringing(0)).unwrap();
        engine.dispatch(idle(5_000)).unwrap();
        assert!(source.0.borrow().is_empty());

        engine.dispatch(off_hook(10_000)).unwrap();
        // duplicate off-hook must not re-register
        engine.dispatch(off_hook(11_000)).unwrap();
        engine.dispatch(idle(20_000)).unwrap();
        assert_eq!(*source.0.borrow(), vec!["start", "stop"]);
    }

    #[test]
    fn test_store_failure_surfaces_and_engine_recovers() {
        struct FailingStore;

        impl SessionStore for FailingStore {
            fn save_session(&mut self, _record: &SessionRecord) -> Result<SessionId, TrackError> {
                Err(TrackError::Store("disk full".into()))
            }

            fn save_minute_records(
                &mut self,
                _id: SessionId,
                _records: &[MinuteRecord],
            ) -> Result<(), TrackError> {
                Ok(())
            }

            fn load_session(&self, _id: SessionId) -> Result<Option<SessionRecord>, TrackError> {
                Ok(None)
            }

            fn load_minute_records(&self, _id: SessionId) -> Result<Vec<MinuteRecord>, TrackError> {
                Ok(vec![])
            }

            fn load_sessions(&self) -> Result<Vec<(SessionId, SessionRecord)>, TrackError> {
                Ok(vec![])
            }
        }

        let mut engine = CallEngine::new(FailingStore);
        engine.dispatch(off_hook(0)).unwrap();
        engine.dispatch(sensor(1_000, 100)).unwrap();
        engine.dispatch(sensor(2_000, 110)).unwrap();

        // the failure surfaces from the idle dispatch; the session data is
        // gone, not retried
        match engine.dispatch(idle(60_000)) {
            Err(TrackError::Store(_)) => {}
            other => panic!("expected Store error, got {:?}", other),
        }
        assert_eq!(engine.call_state(), CallState::Idle);
        assert!(!engine.is_tracking());

        // the engine itself keeps working, the next call tracks normally
        engine.dispatch(off_hook(70_000)).unwrap();
        assert!(engine.is_tracking());
        assert_eq!(engine.call_state(), CallState::Active);
    }

    #[test]
    fn test_reconstruct_unknown_session() {
        let engine = CallEngine::new(MemoryStore::new());
        let id = uuid::Uuid::new_v4();
        match engine.reconstruct(id) {
            Err(TrackError::UnknownSession(unknown)) => assert_eq!(unknown, id),
            other => panic!("expected UnknownSession, got {:?}", other),
        }
    }

    #[test]
    fn test_two_calls_back_to_back() {
        let mut engine = CallEngine::new(MemoryStore::new());

        engine.dispatch(off_hook(0)).unwrap();
        engine.dispatch(sensor(500, 100)).unwrap();
        engine.dispatch(sensor(1_000, 101)).unwrap();
        engine.dispatch(idle(10_000)).unwrap();

        engine.dispatch(ringing(20_000)).unwrap();
        engine.dispatch(off_hook(21_000)).unwrap();
        // calibration starts over, the first reading is a baseline again
        engine.dispatch(sensor(22_000, 150)).unwrap();
        engine.dispatch(sensor(23_000, 157)).unwrap();
        engine.dispatch(idle(80_000)).unwrap();

        let sessions = engine.store().load_sessions().unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].1.step_count, 1);
        assert!(!sessions[0].1.incoming);
        assert_eq!(sessions[1].1.step_count, 7);
        assert!(sessions[1].1.incoming);
    }
}
