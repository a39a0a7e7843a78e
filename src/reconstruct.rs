//! Time series reconstruction
//!
//! Minute profiles are stored sparsely: a record exists only for minutes with
//! at least one step. For display and statistics the full call has to be
//! rebuilt, so this module walks the call duration minute by minute, fills
//! the gaps with zeros and derives the summary values in one pass.
//!
//! Reconstruction is pure: it never mutates its input and always produces the
//! same output for the same input.

use crate::error::TrackError;
use crate::types::{MinuteRecord, MinuteSeries};

/// Milliseconds per minute bucket.
pub const MILLIS_PER_MINUTE: u64 = 60_000;

/// Upper bound on the minutes a single call can span (one week). A stored
/// duration beyond this is corrupt and must not drive the series allocation.
pub const MAX_MINUTES: u64 = 7 * 24 * 60;

/// Rebuild the dense per-minute series of one session.
///
/// `records` must be the session's stored minute records sorted by minute,
/// `duration_ms` its recorded call duration. The series always spans
/// `duration_ms / 60000 + 1` minutes, so even a call shorter than a minute
/// yields one entry.
///
/// A duration beyond [`MAX_MINUTES`], a record pointing outside the call
/// duration, or records that are not strictly increasing, indicate an
/// inconsistent store and fail with a dedicated error instead of being
/// truncated or skipped.
pub fn reconstruct(records: &[MinuteRecord], duration_ms: u64) -> Result<MinuteSeries, TrackError> {
    let minute_count = duration_ms / MILLIS_PER_MINUTE + 1;
    if minute_count > MAX_MINUTES {
        return Err(TrackError::ImplausibleDuration { minute_count });
    }

    let mut previous: Option<u32> = None;
    for record in records {
        if u64::from(record.minute) >= minute_count {
            return Err(TrackError::MinuteOutOfRange {
                minute: record.minute,
                minute_count,
            });
        }
        if let Some(previous) = previous {
            if record.minute <= previous {
                return Err(TrackError::UnorderedMinuteRecords {
                    minute: record.minute,
                });
            }
        }
        previous = Some(record.minute);
    }

    let mut minutes = Vec::with_capacity(minute_count as usize);
    let mut step_sum: u64 = 0;
    let mut max_steps: u64 = 0;
    // Kept from the original implementation: min starts at zero and is only
    // ever lowered, so it stays zero for any call containing a zero-step
    // minute (in practice: every call).
    let mut min_steps: u64 = 0;

    let mut index = 0;
    for minute in 0..minute_count {
        match records.get(index) {
            Some(record) if u64::from(record.minute) == minute => {
                minutes.push(record.steps);
                step_sum += record.steps;
                if record.steps > max_steps {
                    max_steps = record.steps;
                }
                if record.steps < min_steps {
                    min_steps = record.steps;
                }
                index += 1;
            }
            _ => minutes.push(0),
        }
    }

    Ok(MinuteSeries {
        minutes,
        step_sum,
        min_steps,
        max_steps,
        avg_steps: step_sum / minute_count,
    })
}
