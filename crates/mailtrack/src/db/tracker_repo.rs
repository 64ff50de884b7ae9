//! Tracker repository: CRUD operations for the `emails` table.
//!
//! Functions borrow a `Connection` rather than a [`Database`](super::Database)
//! so they compose inside a single transaction.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{format_timestamp, parse_timestamp, DatabaseError};

/// A tracker row from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerRow {
    pub id: String,
    pub origin_ip: String,
    pub created_at: DateTime<Utc>,
    pub last_read_at: Option<DateTime<Utc>>,
}

impl TrackerRow {
    fn from_row(row: &Row<'_>) -> Result<Self, DatabaseError> {
        let created: String = row.get("created")?;
        let last_read: Option<String> = row.get("last_read")?;
        Ok(Self {
            id: row.get("id")?,
            origin_ip: row.get("ip")?,
            created_at: parse_timestamp(&created)?,
            last_read_at: last_read.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

/// Checks whether a tracker exists.
pub fn exists(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    let exists = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM emails WHERE id = ?1)",
        params![id],
        |r| r.get(0),
    )?;
    Ok(exists)
}

/// Inserts a new tracker. Fails with a constraint violation if the id is taken.
pub fn insert(conn: &Connection, row: &TrackerRow) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO emails (id, ip, created, last_read) VALUES (?1, ?2, ?3, ?4)",
        params![
            row.id,
            row.origin_ip,
            format_timestamp(&row.created_at),
            row.last_read_at.as_ref().map(format_timestamp),
        ],
    )?;
    Ok(())
}

/// Finds a tracker by id.
pub fn find(conn: &Connection, id: &str) -> Result<Option<TrackerRow>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id, ip, created, last_read FROM emails WHERE id = ?1")?;
    let mut rows = stmt.query(params![id])?;
    match rows.next()? {
        Some(row) => Ok(Some(TrackerRow::from_row(row)?)),
        None => Ok(None),
    }
}

/// Returns the IP recorded when the tracker was created.
pub fn find_origin_ip(conn: &Connection, id: &str) -> Result<Option<String>, DatabaseError> {
    let ip = conn
        .query_row(
            "SELECT ip FROM emails WHERE id = ?1",
            params![id],
            |r| r.get(0),
        )
        .optional()?;
    Ok(ip)
}

/// Sets `last_read` for a tracker. Returns the number of rows updated.
pub fn update_last_read(
    conn: &Connection,
    id: &str,
    now: &DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let count = conn.execute(
        "UPDATE emails SET last_read = ?1 WHERE id = ?2",
        params![format_timestamp(now), id],
    )?;
    Ok(count)
}

/// Deletes a tracker and, through the foreign key, all of its read logs.
/// Returns whether a row was removed.
pub fn delete(conn: &Connection, id: &str) -> Result<bool, DatabaseError> {
    let count = conn.execute("DELETE FROM emails WHERE id = ?1", params![id])?;
    Ok(count > 0)
}
