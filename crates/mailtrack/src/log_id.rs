//! Read log identifiers.
//!
//! A log id is `{tracker_id}_{YYYYMMDDhhmmss.ffffff}_{8 hex chars}`. The
//! timestamp keeps ids for one tracker sortable and traceable; the random
//! suffix keeps reads at the same microsecond distinct.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::TrackError;

/// Separator between the parts of a log id. Tracker ids may not contain it.
pub const DELIMITER: char = '_';

/// Number of random bytes in the suffix (two hex chars each).
pub const ENTROPY_BYTES: usize = 4;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%.6f";

/// The components of a parsed log id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogIdParts {
    pub tracker_id: String,
    pub timestamp: DateTime<Utc>,
    pub entropy: String,
}

/// Builds a new log id for a read of `tracker_id` at `timestamp`.
pub fn new_log_id(tracker_id: &str, timestamp: &DateTime<Utc>) -> Result<String, TrackError> {
    let mut bytes = [0u8; ENTROPY_BYTES];
    getrandom::getrandom(&mut bytes).map_err(|e| TrackError::Entropy(e.to_string()))?;

    Ok(format!(
        "{tracker_id}{DELIMITER}{}{DELIMITER}{}",
        timestamp.format(TIMESTAMP_FORMAT),
        hex::encode(bytes)
    ))
}

/// Splits a log id back into its parts. Returns `None` if it is malformed.
pub fn parse_log_id(id: &str) -> Option<LogIdParts> {
    let mut parts = id.rsplitn(3, DELIMITER);
    let entropy = parts.next()?;
    let timestamp = parts.next()?;
    let tracker_id = parts.next()?;

    if tracker_id.is_empty()
        || entropy.len() != ENTROPY_BYTES * 2
        || !entropy.chars().all(|c| c.is_ascii_hexdigit())
    {
        return None;
    }

    let timestamp = NaiveDateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT)
        .ok()?
        .and_utc();

    Some(LogIdParts {
        tracker_id: tracker_id.to_string(),
        timestamp,
        entropy: entropy.to_string(),
    })
}
