//! Storage layer for odTimeTracker.
//!
//! Provides persistence for time entries using `rusqlite`, and implements
//! [`SessionStore`] on top of it.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Each process opens its own connection; cross-process coordination happens
//! inside SQLite (see below).
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 format with millisecond precision
//! (e.g., `2024-01-15T10:30:00.000Z`). This ensures:
//! - Lexicographic ordering matches chronological ordering
//! - Human-readable values in the database
//! - Timezone-aware (always UTC)
//!
//! ## Single Open Entry
//!
//! An entry is open while `stopped_at` is NULL. Starting an entry runs its
//! check-and-insert inside an `IMMEDIATE` transaction, and the unique partial
//! index `idx_entries_single_open` rejects a second open row outright, so two
//! processes racing to start cannot both succeed.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use odt_core::{
    EntryFilter, EntryId, SessionError, SessionStore, TaskName, TimeEntry, ValidationError,
    normalize_description,
};
use rusqlite::{
    Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior, params, params_from_iter,
};
use thiserror::Error;

/// How long a connection waits on a lock held by another process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const ENTRY_COLUMNS: &str = "id, task, description, started_at, stopped_at";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored timestamp.
    #[error("invalid timestamp for entry {entry_id}: {timestamp}")]
    TimestampParse {
        entry_id: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored task name failed validation.
    #[error("invalid task name for entry {entry_id}")]
    InvalidTask {
        entry_id: i64,
        #[source]
        source: ValidationError,
    },
}

impl From<DbError> for SessionError {
    fn from(err: DbError) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for the concurrency model.
pub struct Database {
    conn: Connection,
}

/// Raw column values of an `entries` row.
struct EntryRow {
    id: i64,
    task: String,
    description: Option<String>,
    started_at: String,
    stopped_at: Option<String>,
}

impl EntryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            task: row.get(1)?,
            description: row.get(2)?,
            started_at: row.get(3)?,
            stopped_at: row.get(4)?,
        })
    }

    fn into_entry(self) -> Result<TimeEntry, DbError> {
        let task = TaskName::new(self.task).map_err(|source| DbError::InvalidTask {
            entry_id: self.id,
            source,
        })?;
        let started_at = parse_timestamp(&self.started_at, self.id)?;
        let stopped_at = self
            .stopped_at
            .as_deref()
            .map(|ts| parse_timestamp(ts, self.id))
            .transpose()?;
        Ok(TimeEntry {
            id: EntryId::new(self.id),
            task,
            description: self.description,
            started_at,
            stopped_at,
        })
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let db = Self { conn };
        db.init()?;
        tracing::debug!(path = %path.display(), "opened database");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Closes the connection, reporting any error SQLite raises while doing so.
    pub fn close(self) -> Result<(), DbError> {
        self.conn.close().map_err(|(_, err)| DbError::Sqlite(err))?;
        tracing::debug!("closed database");
        Ok(())
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Entries table: one row per tracked session
            -- started_at/stopped_at: RFC 3339 UTC (e.g., '2024-01-15T10:30:00.000Z')
            -- stopped_at IS NULL marks the open entry
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task TEXT NOT NULL CHECK (length(trim(task)) > 0),
                description TEXT,
                started_at TEXT NOT NULL,
                stopped_at TEXT,
                CHECK (stopped_at IS NULL OR stopped_at >= started_at)
            );

            CREATE INDEX IF NOT EXISTS idx_entries_started ON entries(started_at);
            CREATE INDEX IF NOT EXISTS idx_entries_task ON entries(task);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_entries_single_open
                ON entries((stopped_at IS NULL)) WHERE stopped_at IS NULL;
            ",
        )?;
        Ok(())
    }

    /// Inserts a new open entry unless one is already open.
    ///
    /// Returns `Ok(Err(open))` with the open entry when tracking is already in
    /// progress, leaving the table untouched.
    fn insert_open_entry(
        &mut self,
        task: &TaskName,
        description: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Result<TimeEntry, TimeEntry>, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(open) = query_open_entry(&tx)? {
            return Ok(Err(open));
        }

        let entry = insert_entry(&tx, task, description, at)?;
        tx.commit()?;
        Ok(Ok(entry))
    }

    /// Maps a failed start onto the error reported to the caller.
    ///
    /// A constraint violation on insert means another connection opened an
    /// entry after our check; that entry is reported as the one being tracked.
    fn start_failure(&self, err: DbError) -> SessionError {
        match err {
            DbError::Sqlite(sqlite) if is_constraint_violation(&sqlite) => {
                match self.open_entry() {
                    Ok(Some(open)) => SessionError::AlreadyTracking {
                        task: open.task,
                        since: open.started_at,
                    },
                    Ok(None) => DbError::Sqlite(sqlite).into(),
                    Err(err) => err.into(),
                }
            }
            err => err.into(),
        }
    }

    /// Closes the open entry, if there is one.
    fn close_open_entry(&mut self, at: DateTime<Utc>) -> Result<Option<TimeEntry>, DbError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(open) = query_open_entry(&tx)? else {
            return Ok(None);
        };

        let stopped_at = at.max(open.started_at);
        tx.execute(
            "UPDATE entries SET stopped_at = ? WHERE id = ? AND stopped_at IS NULL",
            params![format_timestamp(stopped_at), open.id.get()],
        )?;
        let entry = query_entry(&tx, open.id.get())?;
        tx.commit()?;
        Ok(Some(entry))
    }

    /// Lists entries matching the filter, ordered by start time then ID.
    pub fn list(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>, DbError> {
        if filter.is_empty_range() {
            return Ok(Vec::new());
        }

        let mut conditions = Vec::new();
        let mut values = Vec::new();
        if let Some(task) = &filter.task {
            conditions.push("task = ?");
            values.push(task.clone());
        }
        if let Some(since) = filter.since {
            conditions.push("started_at >= ?");
            values.push(format_timestamp(since));
        }
        if let Some(until) = filter.until {
            conditions.push("started_at < ?");
            values.push(format_timestamp(until));
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries {where_clause} ORDER BY started_at ASC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), EntryRow::from_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.into_entry()?);
        }
        Ok(entries)
    }

    /// Returns the open entry, if any.
    pub fn open_entry(&self) -> Result<Option<TimeEntry>, DbError> {
        query_open_entry(&self.conn)
    }

    /// Returns the most recently started entry.
    pub fn latest_entry(&self) -> Result<Option<TimeEntry>, DbError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries ORDER BY started_at DESC, id DESC LIMIT 1"
        );
        self.conn
            .query_row(&sql, [], EntryRow::from_row)
            .optional()?
            .map(EntryRow::into_entry)
            .transpose()
    }

    /// Counts all stored entries.
    pub fn entry_count(&self) -> Result<usize, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl SessionStore for Database {
    fn start_entry(
        &mut self,
        task: &TaskName,
        description: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<TimeEntry, SessionError> {
        match self.insert_open_entry(task, description, at) {
            Ok(Ok(entry)) => {
                tracing::debug!(id = %entry.id, task = %entry.task, "started entry");
                Ok(entry)
            }
            Ok(Err(open)) => Err(SessionError::AlreadyTracking {
                task: open.task,
                since: open.started_at,
            }),
            Err(err) => Err(self.start_failure(err)),
        }
    }

    fn stop_entry(&mut self, at: DateTime<Utc>) -> Result<TimeEntry, SessionError> {
        let entry = self
            .close_open_entry(at)?
            .ok_or(SessionError::NothingTracking)?;
        tracing::debug!(id = %entry.id, task = %entry.task, "stopped entry");
        Ok(entry)
    }

    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>, SessionError> {
        Ok(self.list(filter)?)
    }

    fn current_entry(&self) -> Result<Option<TimeEntry>, SessionError> {
        Ok(self.open_entry()?)
    }

    fn last_entry(&self) -> Result<Option<TimeEntry>, SessionError> {
        Ok(self.latest_entry()?)
    }

    fn close(self: Box<Self>) -> Result<(), SessionError> {
        Ok(Database::close(*self)?)
    }
}

fn query_open_entry(conn: &Connection) -> Result<Option<TimeEntry>, DbError> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE stopped_at IS NULL LIMIT 1");
    conn.query_row(&sql, [], EntryRow::from_row)
        .optional()?
        .map(EntryRow::into_entry)
        .transpose()
}

fn insert_entry(
    conn: &Connection,
    task: &TaskName,
    description: Option<&str>,
    at: DateTime<Utc>,
) -> Result<TimeEntry, DbError> {
    let description = normalize_description(description.map(str::to_string));
    conn.execute(
        "INSERT INTO entries (task, description, started_at) VALUES (?, ?, ?)",
        params![task.as_str(), description, format_timestamp(at)],
    )?;
    query_entry(conn, conn.last_insert_rowid())
}

fn query_entry(conn: &Connection, id: i64) -> Result<TimeEntry, DbError> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?");
    conn.query_row(&sql, [id], EntryRow::from_row)?
        .into_entry()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _) if failure.code == ErrorCode::ConstraintViolation
    )
}

fn parse_timestamp(timestamp: &str, entry_id: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            entry_id,
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}
