//! The session store contract.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::entry::{TaskName, TimeEntry};
use crate::filter::EntryFilter;
use crate::report::Report;

/// Failures reported by a [`SessionStore`].
#[derive(Debug, Error)]
pub enum SessionError {
    /// A session is already open.
    #[error("already tracking '{task}' since {since}")]
    AlreadyTracking { task: TaskName, since: DateTime<Utc> },

    /// There is no open session to stop.
    #[error("nothing is being tracked")]
    NothingTracking,

    /// The backing storage failed.
    #[error("storage error: {0}")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain operations over time entries.
///
/// Implementations guarantee that at most one entry is open at any time and
/// that every mutating operation is all-or-nothing. Timestamps are supplied by
/// the caller.
pub trait SessionStore {
    /// Opens a new entry for `task` starting at `at`.
    ///
    /// Fails with [`SessionError::AlreadyTracking`] if an entry is open.
    fn start_entry(
        &mut self,
        task: &TaskName,
        description: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<TimeEntry, SessionError>;

    /// Closes the open entry at `at`, returning it.
    ///
    /// The stop time is never earlier than the start time. Fails with
    /// [`SessionError::NothingTracking`] if no entry is open.
    fn stop_entry(&mut self, at: DateTime<Utc>) -> Result<TimeEntry, SessionError>;

    /// Entries matching `filter`, ordered by start time then ID.
    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>, SessionError>;

    /// The open entry, if any.
    fn current_entry(&self) -> Result<Option<TimeEntry>, SessionError>;

    /// The most recently started entry, open or closed.
    fn last_entry(&self) -> Result<Option<TimeEntry>, SessionError>;

    /// Aggregates durations of the entries matching `filter` as of `now`.
    fn report(&self, filter: &EntryFilter, now: DateTime<Utc>) -> Result<Report, SessionError> {
        let entries = self.list_entries(filter)?;
        Ok(Report::aggregate(&entries, now))
    }

    /// Releases the underlying storage.
    fn close(self: Box<Self>) -> Result<(), SessionError>;
}
