//! In-memory session store.
//!
//! Holds entries in a `Vec` and never fails on storage. Used as a substitute
//! store when exercising commands without a database file.

use chrono::{DateTime, Utc};

use crate::entry::{EntryId, TaskName, TimeEntry, normalize_description};
use crate::filter::EntryFilter;
use crate::store::{SessionError, SessionStore};

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Vec<TimeEntry>,
    next_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[TimeEntry] {
        &self.entries
    }

    fn open_index(&self) -> Option<usize> {
        self.entries.iter().position(TimeEntry::is_open)
    }
}

impl SessionStore for MemoryStore {
    fn start_entry(
        &mut self,
        task: &TaskName,
        description: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<TimeEntry, SessionError> {
        if let Some(index) = self.open_index() {
            let open = &self.entries[index];
            return Err(SessionError::AlreadyTracking {
                task: open.task.clone(),
                since: open.started_at,
            });
        }

        self.next_id += 1;
        let entry = TimeEntry {
            id: EntryId::new(self.next_id),
            task: task.clone(),
            description: normalize_description(description.map(str::to_string)),
            started_at: at,
            stopped_at: None,
        };
        self.entries.push(entry.clone());
        Ok(entry)
    }

    fn stop_entry(&mut self, at: DateTime<Utc>) -> Result<TimeEntry, SessionError> {
        let index = self.open_index().ok_or(SessionError::NothingTracking)?;
        let entry = &mut self.entries[index];
        entry.stopped_at = Some(at.max(entry.started_at));
        Ok(entry.clone())
    }

    fn list_entries(&self, filter: &EntryFilter) -> Result<Vec<TimeEntry>, SessionError> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect();
        entries.sort_by_key(|entry| (entry.started_at, entry.id));
        Ok(entries)
    }

    fn current_entry(&self) -> Result<Option<TimeEntry>, SessionError> {
        Ok(self.open_index().map(|index| self.entries[index].clone()))
    }

    fn last_entry(&self) -> Result<Option<TimeEntry>, SessionError> {
        Ok(self
            .entries
            .iter()
            .max_by_key(|entry| (entry.started_at, entry.id))
            .cloned())
    }

    fn close(self: Box<Self>) -> Result<(), SessionError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn task(name: &str) -> TaskName {
        TaskName::new(name).unwrap()
    }

    fn open_count(store: &MemoryStore) -> usize {
        store.entries().iter().filter(|e| e.is_open()).count()
    }

    #[test]
    fn start_then_stop() {
        let mut store = MemoryStore::new();
        let started = store
            .start_entry(&task("spec"), Some("draft"), ts("2025-01-01T10:00:00Z"))
            .unwrap();
        assert!(started.is_open());
        assert_eq!(started.description.as_deref(), Some("draft"));
        assert_eq!(store.current_entry().unwrap(), Some(started.clone()));

        let stopped = store.stop_entry(ts("2025-01-01T10:30:00Z")).unwrap();
        assert_eq!(stopped.id, started.id);
        assert_eq!(stopped.stopped_at, Some(ts("2025-01-01T10:30:00Z")));
        assert_eq!(store.current_entry().unwrap(), None);
    }

    #[test]
    fn double_start_is_rejected_without_new_entry() {
        let mut store = MemoryStore::new();
        store
            .start_entry(&task("spec"), None, ts("2025-01-01T10:00:00Z"))
            .unwrap();

        let err = store
            .start_entry(&task("other"), None, ts("2025-01-01T10:05:00Z"))
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::AlreadyTracking { ref task, .. } if task.as_str() == "spec"
        ));
        assert_eq!(store.entries().len(), 1);
    }

    #[test]
    fn stop_without_open_entry_mutates_nothing() {
        let mut store = MemoryStore::new();
        store
            .start_entry(&task("spec"), None, ts("2025-01-01T10:00:00Z"))
            .unwrap();
        store.stop_entry(ts("2025-01-01T11:00:00Z")).unwrap();
        let before = store.entries().to_vec();

        let err = store.stop_entry(ts("2025-01-01T12:00:00Z")).unwrap_err();
        assert!(matches!(err, SessionError::NothingTracking));
        assert_eq!(store.entries(), before.as_slice());
    }

    #[test]
    fn stop_time_never_precedes_start() {
        let mut store = MemoryStore::new();
        store
            .start_entry(&task("spec"), None, ts("2025-01-01T10:00:00Z"))
            .unwrap();
        let stopped = store.stop_entry(ts("2025-01-01T09:00:00Z")).unwrap();
        assert_eq!(stopped.stopped_at, Some(stopped.started_at));
    }

    #[test]
    fn open_entries_never_exceed_one() {
        // Every start/stop sequence of length 8, encoded as bits.
        for sequence in 0u32..256 {
            let mut store = MemoryStore::new();
            let mut now = ts("2025-01-01T00:00:00Z");
            for step in 0..8 {
                now += Duration::minutes(1);
                if sequence & (1 << step) == 0 {
                    let _ = store.start_entry(&task("t"), None, now);
                } else {
                    let _ = store.stop_entry(now);
                }
                assert!(open_count(&store) <= 1, "sequence {sequence:#010b}");
            }
        }
    }

    #[test]
    fn list_is_ordered_by_start() {
        let mut store = MemoryStore::new();
        for (start, stop) in [
            ("2025-01-01T12:00:00Z", "2025-01-01T12:10:00Z"),
            ("2025-01-01T08:00:00Z", "2025-01-01T08:10:00Z"),
            ("2025-01-01T10:00:00Z", "2025-01-01T10:10:00Z"),
        ] {
            store.start_entry(&task("t"), None, ts(start)).unwrap();
            store.stop_entry(ts(stop)).unwrap();
        }

        let entries = store.list_entries(&EntryFilter::all()).unwrap();
        assert!(entries.windows(2).all(|w| w[0].started_at <= w[1].started_at));
        assert_eq!(
            store.last_entry().unwrap().map(|e| e.started_at),
            Some(ts("2025-01-01T12:00:00Z"))
        );
    }

    #[test]
    fn report_uses_default_aggregation() {
        let mut store = MemoryStore::new();
        store
            .start_entry(&task("spec"), None, ts("2025-01-01T10:00:00Z"))
            .unwrap();
        store.stop_entry(ts("2025-01-01T10:30:00Z")).unwrap();

        let report = store
            .report(&EntryFilter::all(), ts("2025-01-01T12:00:00Z"))
            .unwrap();
        assert_eq!(report.total, Duration::minutes(30));
        assert_eq!(report.per_task[&task("spec")].duration, Duration::minutes(30));
    }
}
