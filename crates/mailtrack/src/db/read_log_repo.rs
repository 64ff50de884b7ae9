//! Read log repository: append and query operations for the `logs` table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use super::{format_timestamp, parse_timestamp, DatabaseError};

/// A read log row from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadLogRow {
    pub id: String,
    pub tracker_id: String,
    pub timestamp: DateTime<Utc>,
    pub ip: String,
}

impl ReadLogRow {
    fn from_row(row: &Row<'_>) -> Result<Self, DatabaseError> {
        let timestamp: String = row.get("timestamp")?;
        Ok(Self {
            id: row.get("id")?,
            tracker_id: row.get("email_id")?,
            timestamp: parse_timestamp(&timestamp)?,
            ip: row.get("ip")?,
        })
    }
}

/// Appends a read log entry.
pub fn insert(conn: &Connection, row: &ReadLogRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO logs (id, email_id, timestamp, ip) VALUES (?1, ?2, ?3, ?4)",
        params![
            row.id,
            row.tracker_id,
            format_timestamp(&row.timestamp),
            row.ip,
        ],
    )?;
    Ok(())
}

/// Lists all read log entries for a tracker, most recent first.
///
/// Entries sharing a timestamp come back in reverse insertion order.
pub fn list_for_tracker(
    conn: &Connection,
    tracker_id: &str,
) -> Result<Vec<ReadLogRow>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, email_id, timestamp, ip FROM logs
         WHERE email_id = ?1
         ORDER BY timestamp DESC, rowid DESC",
    )?;
    let mut rows = stmt.query(params![tracker_id])?;

    let mut logs = Vec::new();
    while let Some(row) = rows.next()? {
        logs.push(ReadLogRow::from_row(row)?);
    }
    Ok(logs)
}

/// Counts read log entries for a tracker.
pub fn count_for_tracker(conn: &Connection, tracker_id: &str) -> Result<u64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM logs WHERE email_id = ?1",
        params![tracker_id],
        |r| r.get(0),
    )?;
    Ok(count)
}
