//! Persistence seam
//!
//! The engine never issues raw queries; it talks to a [`SessionStore`] and
//! leaves schema and transport to the host. Because the finalizer runs on the
//! serialized event path, store implementations should hand the data off to
//! their own worker instead of blocking on storage latency.
//!
//! [`MemoryStore`] is the reference implementation used by the tests and the
//! CLI.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::TrackError;
use crate::types::{MinuteRecord, SessionId, SessionRecord};

/// Storage interface for finished sessions and their minute records.
pub trait SessionStore {
    /// Persist a session record and return its assigned id.
    fn save_session(&mut self, record: &SessionRecord) -> Result<SessionId, TrackError>;

    /// Persist the sparse minute records of a saved session.
    fn save_minute_records(
        &mut self,
        id: SessionId,
        records: &[MinuteRecord],
    ) -> Result<(), TrackError>;

    /// Load a single session record.
    fn load_session(&self, id: SessionId) -> Result<Option<SessionRecord>, TrackError>;

    /// Load the minute records of a session, sorted by minute. A session
    /// stored without steps legitimately has none.
    fn load_minute_records(&self, id: SessionId) -> Result<Vec<MinuteRecord>, TrackError>;

    /// All stored sessions, ascending by start time.
    fn load_sessions(&self) -> Result<Vec<(SessionId, SessionRecord)>, TrackError>;

    /// Sessions started within `[start, end]`, ascending by start time.
    fn load_sessions_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<(SessionId, SessionRecord)>, TrackError> {
        Ok(self
            .load_sessions()?
            .into_iter()
            .filter(|(_, record)| record.started_at >= start && record.started_at <= end)
            .collect())
    }
}

/// In-memory session store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sessions: Vec<(SessionId, SessionRecord)>,
    minutes: HashMap<SessionId, Vec<MinuteRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl SessionStore for MemoryStore {
    fn save_session(&mut self, record: &SessionRecord) -> Result<SessionId, TrackError> {
        let id = Uuid::new_v4();
        self.sessions.push((id, record.clone()));
        Ok(id)
    }

    fn save_minute_records(
        &mut self,
        id: SessionId,
        records: &[MinuteRecord],
    ) -> Result<(), TrackError> {
        self.minutes.insert(id, records.to_vec());
        Ok(())
    }

    fn load_session(&self, id: SessionId) -> Result<Option<SessionRecord>, TrackError> {
        Ok(self
            .sessions
            .iter()
            .find(|(session_id, _)| *session_id == id)
            .map(|(_, record)| record.clone()))
    }

    fn load_minute_records(&self, id: SessionId) -> Result<Vec<MinuteRecord>, TrackError> {
        Ok(self.minutes.get(&id).cloned().unwrap_or_default())
    }

    fn load_sessions(&self) -> Result<Vec<(SessionId, SessionRecord)>, TrackError> {
        let mut sessions = self.sessions.clone();
        sessions.sort_by_key(|(_, record)| record.started_at);
        Ok(sessions)
    }
}
