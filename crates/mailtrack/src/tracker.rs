//! Tracker creation and read recording.
//!
//! [`ReadRecorder`] owns the decision of whether a pixel fetch is a read
//! worth logging. Each decision runs inside one IMMEDIATE transaction so the
//! origin-IP check, the `last_read` update and the log insert commit together
//! or not at all.

use chrono::{DateTime, SubsecRound, Utc};
use log::{debug, info};
use serde::Serialize;

use crate::db::read_log_repo::{self, ReadLogRow};
use crate::db::tracker_repo::{self, TrackerRow};
use crate::db::Database;
use crate::error::TrackError;
use crate::log_id::{self, DELIMITER};

/// Longest tracker id accepted at creation, in bytes.
pub const MAX_TRACKER_ID_LEN: usize = 128;

type Result<T> = std::result::Result<T, TrackError>;

/// One tracked email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tracker {
    pub id: String,
    #[serde(rename = "originIP")]
    pub origin_ip: String,
    pub created_at: DateTime<Utc>,
    pub last_read_at: Option<DateTime<Utc>>,
}

impl From<TrackerRow> for Tracker {
    fn from(row: TrackerRow) -> Self {
        Self {
            id: row.id,
            origin_ip: row.origin_ip,
            created_at: row.created_at,
            last_read_at: row.last_read_at,
        }
    }
}

/// One recorded read of a tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadLogEntry {
    pub id: String,
    pub tracker_id: String,
    pub timestamp: DateTime<Utc>,
    pub ip: String,
}

impl From<ReadLogRow> for ReadLogEntry {
    fn from(row: ReadLogRow) -> Self {
        Self {
            id: row.id,
            tracker_id: row.tracker_id,
            timestamp: row.timestamp,
            ip: row.ip,
        }
    }
}

impl From<&ReadLogEntry> for ReadLogRow {
    fn from(entry: &ReadLogEntry) -> Self {
        Self {
            id: entry.id.clone(),
            tracker_id: entry.tracker_id.clone(),
            timestamp: entry.timestamp,
            ip: entry.ip.clone(),
        }
    }
}

/// What [`ReadRecorder::record_read`] decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A read from a non-origin IP was logged.
    Recorded(ReadLogEntry),
    /// The requester IP equals the origin IP; nothing was written.
    SkippedOrigin,
    /// The tracker vanished before the transaction started; nothing was written.
    TrackerMissing,
}

impl ReadOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, Self::Recorded(_))
    }
}

/// Checks that a tracker id can be stored and later embedded in log ids.
pub fn validate_tracker_id(id: &str) -> Result<()> {
    let reason = if id.is_empty() {
        Some("must not be empty".to_string())
    } else if id.len() > MAX_TRACKER_ID_LEN {
        Some(format!("must be at most {} bytes", MAX_TRACKER_ID_LEN))
    } else if id.contains(DELIMITER) {
        Some(format!("must not contain '{}'", DELIMITER))
    } else if id.chars().any(|c| c == '/' || c.is_whitespace() || c.is_control()) {
        Some("must not contain '/', whitespace or control characters".to_string())
    } else {
        None
    };

    match reason {
        Some(reason) => Err(TrackError::InvalidTrackerId {
            id: id.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Current time at the precision timestamps are stored with.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Creates trackers and records reads against a shared [`Database`].
#[derive(Clone)]
pub struct ReadRecorder {
    db: Database,
}

impl ReadRecorder {
    /// Creates a recorder over the given database handle.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Returns the underlying database handle.
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Registers a new tracker whose origin IP is `origin_ip`.
    ///
    /// Fails with [`TrackError::Conflict`] if the id is already taken; the
    /// existing tracker is left untouched.
    pub fn create_tracker(&self, id: &str, origin_ip: &str) -> Result<Tracker> {
        validate_tracker_id(id)?;

        let row = TrackerRow {
            id: id.to_string(),
            origin_ip: origin_ip.to_string(),
            created_at: now(),
            last_read_at: None,
        };

        self.db.with_transaction(|tx| {
            if tracker_repo::exists(tx, id)? {
                return Err(TrackError::Conflict(id.to_string()));
            }
            tracker_repo::insert(tx, &row).map_err(|e| {
                if e.is_unique_violation() {
                    TrackError::Conflict(id.to_string())
                } else {
                    TrackError::Storage(e)
                }
            })
        })?;

        info!("Created tracker '{}' (origin {})", id, origin_ip);
        Ok(row.into())
    }

    /// Checks whether a tracker exists.
    pub fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.db.with_conn(|conn| tracker_repo::exists(conn, id))?)
    }

    /// Loads a tracker.
    pub fn tracker(&self, id: &str) -> Result<Tracker> {
        self.db
            .with_conn(|conn| tracker_repo::find(conn, id))?
            .map(Tracker::from)
            .ok_or_else(|| TrackError::NotFound(id.to_string()))
    }

    /// Records a fetch of the tracking pixel by `requester_ip`.
    ///
    /// Reads from the origin IP are treated as the sender's own access and
    /// skipped, as is a tracker that no longer exists. Otherwise `last_read`
    /// is bumped and a log entry appended, atomically.
    pub fn record_read(&self, tracker_id: &str, requester_ip: &str) -> Result<ReadOutcome> {
        let outcome = self.db.with_transaction(|tx| {
            if !tracker_repo::exists(tx, tracker_id)? {
                return Ok(ReadOutcome::TrackerMissing);
            }

            let Some(origin_ip) = tracker_repo::find_origin_ip(tx, tracker_id)? else {
                return Ok(ReadOutcome::TrackerMissing);
            };
            if origin_ip == requester_ip {
                return Ok(ReadOutcome::SkippedOrigin);
            }

            let now = now();
            tracker_repo::update_last_read(tx, tracker_id, &now)?;

            let entry = ReadLogEntry {
                id: log_id::new_log_id(tracker_id, &now)?,
                tracker_id: tracker_id.to_string(),
                timestamp: now,
                ip: requester_ip.to_string(),
            };
            read_log_repo::insert(tx, &ReadLogRow::from(&entry))?;

            Ok::<_, TrackError>(ReadOutcome::Recorded(entry))
        })?;

        match &outcome {
            ReadOutcome::Recorded(entry) => {
                info!("Recorded read of '{}' from {} ({})", tracker_id, requester_ip, entry.id)
            }
            ReadOutcome::SkippedOrigin => {
                debug!("Skipped read of '{}' from origin IP {}", tracker_id, requester_ip)
            }
            ReadOutcome::TrackerMissing => {
                debug!("Tracker '{}' vanished before read was recorded", tracker_id)
            }
        }

        Ok(outcome)
    }

    /// Handles a pixel fetch: the tracker must exist, then the read is
    /// recorded (or skipped) by [`record_read`](Self::record_read).
    pub fn track_pixel(&self, tracker_id: &str, requester_ip: &str) -> Result<ReadOutcome> {
        if !self.exists(tracker_id)? {
            return Err(TrackError::NotFound(tracker_id.to_string()));
        }
        self.record_read(tracker_id, requester_ip)
    }

    /// Lists the reads of a tracker, most recent first.
    ///
    /// A tracker without qualifying reads yields an empty list.
    pub fn read_logs(&self, tracker_id: &str) -> Result<Vec<ReadLogEntry>> {
        let logs = self.db.with_conn(|conn| {
            if !tracker_repo::exists(conn, tracker_id)? {
                return Ok(None);
            }
            read_log_repo::list_for_tracker(conn, tracker_id).map(Some)
        })?;

        logs.map(|rows| rows.into_iter().map(ReadLogEntry::from).collect())
            .ok_or_else(|| TrackError::NotFound(tracker_id.to_string()))
    }
}
