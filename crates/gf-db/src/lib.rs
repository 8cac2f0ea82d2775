//! Storage layer for gapfill.
//!
//! Reads and rewrites events in an ActivityWatch SQLite database using
//! `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A run is strictly sequential, so a single connection is used for the whole of it.
//!
//! # Schema
//!
//! Only the columns below are read or written; any other columns the server
//! keeps (event `data`, bucket metadata) are left untouched.
//!
//! - `buckets(id, name, client, ...)`: one row per watcher bucket. `client` holds
//!   the watcher name (e.g. `aw-watcher-window`).
//! - `events(id, bucketrow, starttime, endtime, ...)`: `bucketrow` references
//!   `buckets.id`; times are INTEGER nanoseconds since the Unix epoch.
//!
//! The server owns the schema. [`Database::open`] refuses files that lack
//! these tables instead of creating them.

use std::path::Path;

use gf_core::{BoundaryWriter, Bucket, Event, TimeRange, ValidationError};
use rusqlite::{Connection, ErrorCode, OpenFlags, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// The file is not an SQLite database, or lacks the event tables.
    #[error("not an event database: {reason}")]
    NotAnEventDatabase { reason: String },
    /// An update matched no row.
    #[error("event {0} not found")]
    EventNotFound(i64),
    /// A stored row violates `starttime <= endtime`.
    #[error("invalid stored event: {0}")]
    InvalidEvent(#[from] ValidationError),
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens an existing database for reading and writing.
    ///
    /// The file is never created. Fails with [`DbError::NotAnEventDatabase`]
    /// when the file is not SQLite or is missing the `events`/`buckets` tables.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;
        let db = Self { conn };
        db.verify_schema()?;
        tracing::debug!(path = %path.display(), "opened event database");
        Ok(db)
    }

    /// Opens an in-memory database with an empty event schema.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        create_schema(&conn)?;
        Ok(Self { conn })
    }

    fn verify_schema(&self) -> Result<(), DbError> {
        let result = self.conn.query_row(
            "
            SELECT COUNT(*) FROM sqlite_master
            WHERE type = 'table' AND name IN ('events', 'buckets')
            ",
            [],
            |row| row.get::<_, i64>(0),
        );
        match result {
            Ok(2) => Ok(()),
            Ok(_) => Err(DbError::NotAnEventDatabase {
                reason: "missing events or buckets table".to_string(),
            }),
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::NotADatabase => {
                Err(DbError::NotAnEventDatabase {
                    reason: "file is not an SQLite database".to_string(),
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Lists buckets whose `client` starts with `prefix`, ordered by ID.
    pub fn buckets_for_client(&self, prefix: &str) -> Result<Vec<Bucket>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, name, client
            FROM buckets
            WHERE substr(client, 1, length(?1)) = ?1
            ORDER BY id ASC
            ",
        )?;
        let rows = stmt.query_map([prefix], |row| {
            Ok(Bucket {
                id: row.get(0)?,
                name: row.get(1)?,
                client: row.get(2)?,
            })
        })?;
        let mut buckets = Vec::new();
        for row in rows {
            buckets.push(row?);
        }
        Ok(buckets)
    }

    /// Loads a bucket's events ordered by start time then ID.
    ///
    /// With a range, an event is included if it touches the range at all, so
    /// events straddling either bound are still returned. Both bounds are
    /// inclusive. No matches yields an empty list, not an error.
    pub fn load_events(&self, bucket_id: i64, range: &TimeRange) -> Result<Vec<Event>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, starttime, endtime
            FROM events
            WHERE bucketrow = ?1
              AND (?2 IS NULL OR endtime >= ?2)
              AND (?3 IS NULL OR starttime <= ?3)
            ORDER BY starttime ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map(params![bucket_id, range.start, range.end], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        let mut events = Vec::new();
        for row in rows {
            let (id, start, end) = row?;
            events.push(Event::new(id, start, end)?);
        }
        tracing::debug!(bucket_id, count = events.len(), %range, "loaded events");
        Ok(events)
    }

    /// Writes new boundaries for a single event.
    pub fn update_event_bounds(&self, id: i64, start: i64, end: i64) -> Result<(), DbError> {
        let changed = self.conn.execute(
            "UPDATE events SET starttime = ?, endtime = ? WHERE id = ?",
            params![start, end, id],
        )?;
        if changed == 0 {
            return Err(DbError::EventNotFound(id));
        }
        Ok(())
    }

    /// Inserts a bucket and returns its ID.
    pub fn insert_bucket(&self, name: &str, client: &str) -> Result<i64, DbError> {
        self.conn.execute(
            "
            INSERT INTO buckets (name, type, client, hostname, created)
            VALUES (?, 'currentwindow', ?, 'localhost', '1970-01-01T00:00:00Z')
            ",
            params![name, client],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Inserts an event into a bucket and returns its ID.
    pub fn insert_event(&self, bucket_id: i64, start: i64, end: i64) -> Result<i64, DbError> {
        self.conn.execute(
            "INSERT INTO events (bucketrow, starttime, endtime, data) VALUES (?, ?, ?, '{}')",
            params![bucket_id, start, end],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}

impl BoundaryWriter for Database {
    type Error = DbError;

    fn write_bounds(&mut self, event: &Event) -> Result<(), Self::Error> {
        self.update_event_bounds(event.id, event.start, event.end)
    }
}

/// Creates the tables an ActivityWatch server would have created.
///
/// This is idempotent - safe to call on an already-initialized database.
pub fn create_schema(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS buckets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            type TEXT NOT NULL,
            client TEXT NOT NULL,
            hostname TEXT NOT NULL,
            created TEXT NOT NULL,
            data TEXT NOT NULL DEFAULT '{}'
        );

        -- starttime/endtime: INTEGER nanoseconds since the Unix epoch
        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bucketrow INTEGER NOT NULL,
            starttime INTEGER NOT NULL,
            endtime INTEGER NOT NULL,
            data TEXT NOT NULL,
            FOREIGN KEY (bucketrow) REFERENCES buckets(id)
        );

        CREATE INDEX IF NOT EXISTS events_bucketrow_index ON events(bucketrow);
        CREATE INDEX IF NOT EXISTS events_starttime_index ON events(starttime);
        CREATE INDEX IF NOT EXISTS events_endtime_index ON events(endtime);
        ",
    )?;
    Ok(())
}
