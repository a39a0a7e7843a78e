//! Step counter calibration
//!
//! The hardware step counter reports a cumulative value since its last reset,
//! and the first report after registering a listener replays the last known
//! value rather than a fresh measurement. This module turns that raw stream
//! into per-event deltas relative to a per-session baseline.

use log::debug;

/// Result of feeding one raw counter value to the calibrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterObservation {
    /// First reading of the session; consumed to seed the baseline, no delta.
    Baseline,
    /// Same value as the previous reading; dropped.
    Duplicate,
    /// Reading was lower than the previous one (counter discontinuity, e.g.
    /// a reboot mid-call). Baseline and last value are re-seeded from it and
    /// it yields no delta.
    Rebaselined,
    /// A real measurement.
    Step {
        /// Steps since the previous reading
        delta: u64,
        /// Steps since the session baseline, for live display
        relative: u64,
    },
}

/// Calibrates raw cumulative counter readings into per-event deltas.
///
/// One calibrator exists per active session; a new session starts from a
/// fresh, unset baseline.
#[derive(Debug, Clone, Default)]
pub struct StepCounterCalibrator {
    baseline: Option<u64>,
    last: Option<u64>,
}

impl StepCounterCalibrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw counter value and classify it.
    pub fn observe(&mut self, value: u64) -> CounterObservation {
        if self.last == Some(value) {
            // the sensor occasionally reports the same value twice
            return CounterObservation::Duplicate;
        }

        let (baseline, last) = match (self.baseline, self.last) {
            (Some(baseline), Some(last)) => (baseline, last),
            _ => {
                // Registration replay: this carries the counter state from
                // before the call, not a measurement.
                self.baseline = Some(value);
                self.last = Some(value);
                return CounterObservation::Baseline;
            }
        };

        if value < last {
            debug!(
                "counter went backwards ({} -> {}), re-seeding baseline",
                last, value
            );
            self.baseline = Some(value);
            self.last = Some(value);
            return CounterObservation::Rebaselined;
        }

        self.last = Some(value);
        CounterObservation::Step {
            delta: value - last,
            relative: value - baseline,
        }
    }

    /// Whether a baseline has been established, i.e. at least one reading
    /// arrived since the session started.
    pub fn is_calibrated(&self) -> bool {
        self.baseline.is_some()
    }
}
