//! JSON export
//!
//! Serializes stored sessions together with their minute records into a
//! single pretty-printed JSON document for sharing or backup. Caller
//! identifiers are stripped unless the caller explicitly asks to include
//! them, so an export is privacy-safe by default.

use chrono::{DateTime, Utc};
use log::debug;
use serde_json::{json, Value};

use crate::error::TrackError;
use crate::store::SessionStore;
use crate::types::{SessionId, SessionRecord};

/// Export every stored session.
pub fn export_sessions<S: SessionStore>(
    store: &S,
    include_caller_ids: bool,
) -> Result<String, TrackError> {
    let sessions = store.load_sessions()?;
    export(store, sessions, include_caller_ids)
}

/// Export the sessions started within `[start, end]`.
pub fn export_sessions_in_range<S: SessionStore>(
    store: &S,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    include_caller_ids: bool,
) -> Result<String, TrackError> {
    let sessions = store.load_sessions_in_range(start, end)?;
    export(store, sessions, include_caller_ids)
}

fn export<S: SessionStore>(
    store: &S,
    sessions: Vec<(SessionId, SessionRecord)>,
    include_caller_ids: bool,
) -> Result<String, TrackError> {
    let start_date = sessions.first().map(|(_, record)| record.started_at);
    let end_date = sessions.last().map(|(_, record)| record.started_at);
    debug!("exporting {} sessions", sessions.len());

    let mut exported = Vec::with_capacity(sessions.len());
    for (id, record) in sessions {
        let minutes = store.load_minute_records(id)?;

        let mut value = serde_json::to_value(&record)?;
        if let Value::Object(object) = &mut value {
            if !include_caller_ids {
                object.remove("caller_id");
            }
            object.insert("id".to_string(), serde_json::to_value(id)?);
            object.insert("minute_steps".to_string(), serde_json::to_value(minutes)?);
        }
        exported.push(value);
    }

    let document = json!({
        "start_date": start_date,
        "end_date": end_date,
        "call_sessions": exported,
    });

    Ok(serde_json::to_string_pretty(&document)?)
}
