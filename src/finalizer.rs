//! Session finalization
//!
//! When a call ends, the finished session either becomes a persisted record
//! plus its minute records, or is discarded. A session without steps is only
//! kept when the host's "store empty sessions" setting says so; this also
//! covers calls during which the step sensor never delivered a reading, which
//! still capture their duration.

use log::{debug, info};

use crate::error::TrackError;
use crate::host::Settings;
use crate::store::SessionStore;
use crate::types::{FinishedSession, SessionId, SessionRecord};

/// What became of a finished session.
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizeOutcome {
    /// The session was persisted.
    Saved { id: SessionId, record: SessionRecord },
    /// The session had no steps and the host does not keep empty sessions.
    Discarded { duration_ms: u64 },
}

/// Applies the keep-or-discard policy and persists kept sessions.
pub struct SessionFinalizer;

impl SessionFinalizer {
    /// Finalize a finished session.
    ///
    /// Store failures surface as errors; the session data is lost in that
    /// case (no retry), but the engine keeps running.
    pub fn finalize<S: SessionStore>(
        finished: FinishedSession,
        settings: &dyn Settings,
        store: &mut S,
    ) -> Result<FinalizeOutcome, TrackError> {
        let duration_ms = (finished.ended_at - finished.started_at)
            .num_milliseconds()
            .max(0) as u64;

        if finished.step_count == 0 && !settings.store_empty_sessions() {
            info!("discarding session without steps ({} ms)", duration_ms);
            return Ok(FinalizeOutcome::Discarded { duration_ms });
        }

        let record = SessionRecord {
            started_at: finished.started_at,
            duration_ms,
            step_count: finished.step_count,
            incoming: finished.incoming,
            caller_id: finished.caller_id,
        };

        let id = store.save_session(&record)?;
        store.save_minute_records(id, &finished.minutes)?;
        debug!(
            "stored session {} with {} minute records",
            id,
            finished.minutes.len()
        );

        Ok(FinalizeOutcome::Saved { id, record })
    }
}
