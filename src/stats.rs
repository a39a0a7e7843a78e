//! Period statistics
//!
//! Aggregates over stored sessions for summary and statistics views: totals,
//! maxima and truncated means over a day, a week or any list of sessions the
//! caller selects. Plus the small time helpers the display layers share.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::TrackError;
use crate::store::SessionStore;
use crate::types::SessionRecord;

pub const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * 1000;
pub const MILLIS_PER_WEEK: u64 = 7 * MILLIS_PER_DAY;

/// Aggregated numbers over a set of sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PeriodStats {
    pub session_count: u64,
    pub total_steps: u64,
    pub total_duration_ms: u64,
    /// Most steps counted in a single session
    pub max_steps: u64,
    /// Longest single session
    pub max_duration_ms: u64,
    /// Truncated mean steps per session
    pub mean_steps: u64,
    /// Truncated mean session duration
    pub mean_duration_ms: u64,
}

impl PeriodStats {
    /// Aggregate the given sessions. An empty slice yields all zeros.
    pub fn for_sessions(sessions: &[SessionRecord]) -> Self {
        if sessions.is_empty() {
            return Self::default();
        }

        let mut stats = Self {
            session_count: sessions.len() as u64,
            ..Self::default()
        };

        for session in sessions {
            stats.total_steps += session.step_count;
            stats.total_duration_ms += session.duration_ms;
            stats.max_steps = stats.max_steps.max(session.step_count);
            stats.max_duration_ms = stats.max_duration_ms.max(session.duration_ms);
        }

        stats.mean_steps = stats.total_steps / stats.session_count;
        stats.mean_duration_ms = stats.total_duration_ms / stats.session_count;
        stats
    }
}

/// Aggregate the sessions of the day starting at `day_start`.
pub fn stats_for_day<S: SessionStore>(
    store: &S,
    day_start: DateTime<Utc>,
) -> Result<PeriodStats, TrackError> {
    stats_for_period(store, day_start, MILLIS_PER_DAY)
}

/// Aggregate the sessions of the week starting at `week_start`.
pub fn stats_for_week<S: SessionStore>(
    store: &S,
    week_start: DateTime<Utc>,
) -> Result<PeriodStats, TrackError> {
    stats_for_period(store, week_start, MILLIS_PER_WEEK)
}

fn stats_for_period<S: SessionStore>(
    store: &S,
    start: DateTime<Utc>,
    length_ms: u64,
) -> Result<PeriodStats, TrackError> {
    // the window is [start, start + length); the range query is inclusive on
    // both ends
    let end = start + Duration::milliseconds(length_ms as i64 - 1);
    let records: Vec<SessionRecord> = store
        .load_sessions_in_range(start, end)?
        .into_iter()
        .map(|(_, record)| record)
        .collect();
    Ok(PeriodStats::for_sessions(&records))
}

/// Format a millisecond duration as `H:MM:SS`.
pub fn millis_to_time_string(millis: u64) -> String {
    let seconds = millis / 1000;
    format!(
        "{}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}
