//! Minute aggregation
//!
//! Step deltas arrive with millisecond offsets relative to the session start
//! and are summed into per-minute buckets. Only minutes with a positive total
//! are emitted, which keeps the stored representation sparse: a record's
//! absence means a zero-step minute.

use crate::types::MinuteRecord;

/// Incremental aggregator bucketing step deltas into per-minute totals.
///
/// Input timestamps must be non-decreasing (guaranteed by the event source),
/// which makes the emitted records strictly increasing by minute.
#[derive(Debug, Clone, Default)]
pub struct MinuteAggregator {
    current_minute: u32,
    accumulator: u64,
    records: Vec<MinuteRecord>,
}

impl MinuteAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step delta observed `relative_ms` milliseconds into the session.
    pub fn add(&mut self, relative_ms: u64, delta: u64) {
        // whole seconds first, then minutes
        let minute = ((relative_ms / 1000) / 60) as u32;

        if minute != self.current_minute {
            self.flush_current();
            self.current_minute = minute;
        }

        self.accumulator += delta;
    }

    /// End of stream: flush the final bucket and return the sparse records.
    pub fn finish(mut self) -> Vec<MinuteRecord> {
        self.flush_current();
        self.records
    }

    fn flush_current(&mut self) {
        if self.accumulator > 0 {
            self.records.push(MinuteRecord {
                minute: self.current_minute,
                steps: self.accumulator,
            });
            self.accumulator = 0;
        }
    }
}
