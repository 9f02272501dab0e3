//! Entry selection for listings and reports.

use chrono::{DateTime, Utc};

use crate::entry::TimeEntry;

/// Criteria an entry must meet to be listed or reported.
///
/// The range applies to `started_at` and is half-open: `since` is inclusive,
/// `until` is exclusive. Absent criteria match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    /// Exact task-name match.
    pub task: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl EntryFilter {
    /// A filter that matches every entry.
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }

    #[must_use]
    pub const fn with_range(
        mut self,
        since: Option<DateTime<Utc>>,
        until: Option<DateTime<Utc>>,
    ) -> Self {
        self.since = since;
        self.until = until;
        self
    }

    /// Returns true when the range cannot match anything.
    pub fn is_empty_range(&self) -> bool {
        matches!((self.since, self.until), (Some(since), Some(until)) if since >= until)
    }

    pub fn matches(&self, entry: &TimeEntry) -> bool {
        if self
            .task
            .as_deref()
            .is_some_and(|task| task != entry.task.as_str())
        {
            return false;
        }
        if self.since.is_some_and(|since| entry.started_at < since) {
            return false;
        }
        if self.until.is_some_and(|until| entry.started_at >= until) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryId, TaskName};

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn entry(task: &str, started_at: &str) -> TimeEntry {
        TimeEntry {
            id: EntryId::new(1),
            task: TaskName::new(task).unwrap(),
            description: None,
            started_at: ts(started_at),
            stopped_at: None,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(EntryFilter::all().matches(&entry("a", "2025-01-01T00:00:00Z")));
    }

    #[test]
    fn task_filter_is_exact() {
        let filter = EntryFilter::all().with_task("spec");
        assert!(filter.matches(&entry("spec", "2025-01-01T00:00:00Z")));
        assert!(!filter.matches(&entry("spec-review", "2025-01-01T00:00:00Z")));
    }

    #[test]
    fn range_is_half_open() {
        let filter = EntryFilter::all().with_range(
            Some(ts("2025-01-01T00:00:00Z")),
            Some(ts("2025-01-02T00:00:00Z")),
        );
        assert!(filter.matches(&entry("a", "2025-01-01T00:00:00Z")));
        assert!(filter.matches(&entry("a", "2025-01-01T23:59:59Z")));
        assert!(!filter.matches(&entry("a", "2025-01-02T00:00:00Z")));
        assert!(!filter.matches(&entry("a", "2024-12-31T23:59:59Z")));
    }

    #[test]
    fn inverted_range_matches_nothing() {
        let filter = EntryFilter::all().with_range(
            Some(ts("2025-01-02T00:00:00Z")),
            Some(ts("2025-01-01T00:00:00Z")),
        );
        assert!(filter.is_empty_range());
        assert!(!filter.matches(&entry("a", "2025-01-01T12:00:00Z")));
    }
}
