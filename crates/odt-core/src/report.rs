//! Duration aggregation over time entries.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::entry::{TaskName, TimeEntry};

/// Aggregated time for a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskTotal {
    pub duration: Duration,
    pub entries: usize,
}

impl Default for TaskTotal {
    fn default() -> Self {
        Self {
            duration: Duration::zero(),
            entries: 0,
        }
    }
}

/// Aggregate durations for a set of entries.
///
/// Closed entries contribute `stopped_at - started_at`. An entry that is still
/// open contributes the time elapsed up to `generated_at`, so totals read as
/// "so far".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub total: Duration,
    pub per_task: BTreeMap<TaskName, TaskTotal>,
    pub entry_count: usize,
    /// Task of the open entry, if it is part of the report.
    pub open_task: Option<TaskName>,
}

impl Report {
    pub fn aggregate<'a>(
        entries: impl IntoIterator<Item = &'a TimeEntry>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut report = Self {
            generated_at: now,
            total: Duration::zero(),
            per_task: BTreeMap::new(),
            entry_count: 0,
            open_task: None,
        };

        for entry in entries {
            let duration = entry.duration_at(now);
            let task_total = report.per_task.entry(entry.task.clone()).or_default();
            task_total.duration += duration;
            task_total.entries += 1;
            report.total += duration;
            report.entry_count += 1;
            if entry.is_open() {
                report.open_task = Some(entry.task.clone());
            }
        }

        report
    }

    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Tasks sorted by duration, longest first; ties keep name order.
    pub fn tasks_by_duration(&self) -> Vec<(&TaskName, &TaskTotal)> {
        let mut tasks: Vec<_> = self.per_task.iter().collect();
        tasks.sort_by_key(|(_, total)| std::cmp::Reverse(total.duration));
        tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryId;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn entry(id: i64, task: &str, start: &str, stop: Option<&str>) -> TimeEntry {
        TimeEntry {
            id: EntryId::new(id),
            task: TaskName::new(task).unwrap(),
            description: None,
            started_at: ts(start),
            stopped_at: stop.map(ts),
        }
    }

    #[test]
    fn closed_entry_contributes_exact_duration() {
        let entries = [entry(
            1,
            "writing",
            "2025-01-01T10:00:00Z",
            Some("2025-01-01T10:30:00Z"),
        )];
        let report = Report::aggregate(&entries, ts("2025-01-02T00:00:00Z"));

        let writing = TaskName::new("writing").unwrap();
        assert_eq!(report.per_task[&writing].duration, Duration::minutes(30));
        assert_eq!(report.total, Duration::minutes(30));
        assert_eq!(report.open_task, None);
    }

    #[test]
    fn open_entry_counts_so_far() {
        let entries = [
            entry(
                1,
                "writing",
                "2025-01-01T10:00:00Z",
                Some("2025-01-01T10:30:00Z"),
            ),
            entry(2, "review", "2025-01-01T11:00:00Z", None),
        ];
        let report = Report::aggregate(&entries, ts("2025-01-01T11:15:00Z"));

        let review = TaskName::new("review").unwrap();
        assert_eq!(report.per_task[&review].duration, Duration::minutes(15));
        assert_eq!(report.total, Duration::minutes(45));
        assert_eq!(report.open_task, Some(review));
    }

    #[test]
    fn repeated_task_is_summed() {
        let entries = [
            entry(
                1,
                "writing",
                "2025-01-01T10:00:00Z",
                Some("2025-01-01T10:30:00Z"),
            ),
            entry(
                2,
                "review",
                "2025-01-01T10:30:00Z",
                Some("2025-01-01T10:40:00Z"),
            ),
            entry(
                3,
                "writing",
                "2025-01-01T11:00:00Z",
                Some("2025-01-01T12:00:00Z"),
            ),
        ];
        let report = Report::aggregate(&entries, ts("2025-01-02T00:00:00Z"));

        let ordered: Vec<_> = report
            .tasks_by_duration()
            .into_iter()
            .map(|(task, total)| (task.as_str(), total.entries))
            .collect();
        assert_eq!(ordered, vec![("writing", 2), ("review", 1)]);
        assert_eq!(report.total, Duration::minutes(100));
        assert_eq!(report.entry_count, 3);
    }

    #[test]
    fn empty_report() {
        let report = Report::aggregate(&[], ts("2025-01-01T00:00:00Z"));
        assert!(report.is_empty());
        assert_eq!(report.total, Duration::zero());
    }
}
