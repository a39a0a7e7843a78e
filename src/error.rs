//! Error types for callstride

use crate::types::SessionId;
use thiserror::Error;

/// Errors surfaced by the tracking and reconstruction paths
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("storage error: {0}")]
    Store(String),

    #[error("unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("minute record {minute} lies outside a call of {minute_count} minutes")]
    MinuteOutOfRange { minute: u32, minute_count: u64 },

    #[error("implausible call duration spanning {minute_count} minutes")]
    ImplausibleDuration { minute_count: u64 },

    #[error("minute records out of order at minute {minute}")]
    UnorderedMinuteRecords { minute: u32 },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
