//! Scheduler - single authority over the event timeline
//!
//! Owns an [`IntervalIndex`] (no-overlap checks) and a [`LookaheadQueue`]
//! ("what happens next"), both rebuilt from the persisted schedule rows at
//! construction. All three are updated under one mutex so an overlap check
//! and the insert that follows it cannot interleave with another request.
//!
//! ```text
//! schedule_event ──► overlap? ──yes──► Conflict (no mutation)
//!                       │no
//!                       ▼
//!              index.insert + queue.push ──► store.add_schedule
//!                                                 │err
//!                                                 ▼
//!                                       roll back both, Persistence
//! ```

mod interval;
mod queue;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::store::{ScheduleStore, StoreError};
use crate::types::{Event, ScheduleEntry};

pub use interval::IntervalIndex;
pub use queue::LookaheadQueue;

/// Errors raised by the scheduler
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The requested slot overlaps an existing booking
    #[error("Conflict with event {title} at {start}")]
    Conflict {
        event_id: String,
        title: String,
        start: DateTime<Utc>,
    },
    #[error("Event {0} is already scheduled")]
    AlreadyScheduled(String),
    #[error("Event {event_id} has an invalid duration of {hours} hours")]
    InvalidDuration { event_id: String, hours: f64 },
    #[error("Schedule persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

#[derive(Debug, Default)]
struct Timeline {
    index: IntervalIndex,
    queue: LookaheadQueue,
}

/// Conflict-free event timeline backed by a [`ScheduleStore`]
pub struct Scheduler {
    store: Arc<dyn ScheduleStore>,
    timeline: Mutex<Timeline>,
}

impl Scheduler {
    /// Build a scheduler from every persisted schedule row
    ///
    /// Rows are trusted and loaded as-is. Overlapping rows are reported with
    /// a warning but not rejected; [`Scheduler::conflicts`] lists them.
    pub fn new(store: Arc<dyn ScheduleStore>) -> Result<Self, SchedulerError> {
        let rows = store.get_schedule()?;
        let mut timeline = Timeline::default();

        for row in &rows {
            match row.to_entry() {
                Some(entry) => {
                    timeline.index.insert(entry.start, entry.end, &entry.event_id);
                    timeline.queue.push(entry.start, &entry.event_id);
                }
                None => warn!(
                    event_id = %row.event_id,
                    start_ts = row.start_ts,
                    end_ts = row.end_ts,
                    "Skipping schedule row with out-of-range timestamps"
                ),
            }
        }

        let overlapping = find_conflicts(&timeline.index);
        for (a, b) in &overlapping {
            warn!(first = %a, second = %b, "Persisted schedule rows overlap");
        }

        info!(
            scheduled = timeline.index.len(),
            overlapping = overlapping.len(),
            "Schedule loaded"
        );

        Ok(Self {
            store,
            timeline: Mutex::new(timeline),
        })
    }

    /// Reserve `[event.date, event.date + duration)` for the event
    ///
    /// Fails with [`SchedulerError::Conflict`] naming the first overlapping
    /// event; nothing changes in that case. A failed persist rolls the
    /// in-memory insert back.
    pub fn schedule_event(&self, event: &Event) -> Result<ScheduleEntry, SchedulerError> {
        let end = event.end().ok_or_else(|| SchedulerError::InvalidDuration {
            event_id: event.id.clone(),
            hours: event.duration_hours,
        })?;
        let entry = ScheduleEntry::new(event.id.clone(), event.date, end);

        let mut timeline = self.timeline.lock();

        if timeline.index.contains(&entry.event_id) {
            return Err(SchedulerError::AlreadyScheduled(entry.event_id));
        }

        if let Some((start, _, conflicting_id)) =
            timeline.index.first_overlapping(entry.start, entry.end)
        {
            let conflict = self.describe_conflict(conflicting_id, start);
            warn!(event_id = %entry.event_id, conflict = %conflict, "Scheduling rejected");
            return Err(conflict);
        }

        timeline.index.insert(entry.start, entry.end, &entry.event_id);
        timeline.queue.push(entry.start, &entry.event_id);

        if let Err(e) = self.store.add_schedule(&entry.to_row()) {
            timeline.index.remove_by_event(&entry.event_id);
            timeline.queue.remove(&entry.event_id);
            error!(event_id = %entry.event_id, error = %e, "Schedule row not persisted, rolled back");
            return Err(e.into());
        }

        info!(event_id = %entry.event_id, start = %entry.start, end = %entry.end, "Event scheduled");
        Ok(entry)
    }

    /// Release the event's slot
    ///
    /// Returns whether anything was removed; unknown ids are a no-op. If the
    /// persisted row cannot be deleted the in-memory entries are restored.
    pub fn remove_event(&self, event_id: &str) -> Result<bool, SchedulerError> {
        let mut timeline = self.timeline.lock();

        let intervals = timeline.index.remove_by_event(event_id);
        let queued = timeline.queue.remove(event_id);

        match self.store.remove_schedule(event_id) {
            Ok(row_removed) => {
                let removed = row_removed || !intervals.is_empty();
                if removed {
                    info!(event_id = %event_id, "Event unscheduled");
                } else {
                    debug!(event_id = %event_id, "Nothing to unschedule");
                }
                Ok(removed)
            }
            Err(e) => {
                for (start, end) in intervals {
                    timeline.index.insert(start, end, event_id);
                }
                for start in queued {
                    timeline.queue.push(start, event_id);
                }
                error!(event_id = %event_id, error = %e, "Schedule row not deleted, restored");
                Err(e.into())
            }
        }
    }

    /// Next event starting at or after `now`
    ///
    /// Entries that already started are pruned and will not be returned
    /// again, even for an earlier `now`.
    pub fn get_next_event(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, String)> {
        self.timeline.lock().queue.peek_next(now)
    }

    /// Whether the event currently holds a slot
    pub fn is_scheduled(&self, event_id: &str) -> bool {
        self.timeline.lock().index.contains(event_id)
    }

    /// Every held slot, ordered by start
    pub fn entries(&self) -> Vec<ScheduleEntry> {
        self.timeline
            .lock()
            .index
            .iter()
            .map(|(start, end, id)| ScheduleEntry::new(id, start, end))
            .collect()
    }

    /// Pairs of event ids whose slots overlap; empty when consistent
    pub fn conflicts(&self) -> Vec<(String, String)> {
        find_conflicts(&self.timeline.lock().index)
    }

    /// Number of entries still waiting in the lookahead queue
    pub fn queue_len(&self) -> usize {
        self.timeline.lock().queue.len()
    }

    fn describe_conflict(&self, conflicting_id: &str, indexed_start: DateTime<Utc>) -> SchedulerError {
        let (title, start) = match self.store.get_event(conflicting_id) {
            Ok(Some(event)) => (event.title, event.date),
            Ok(None) => (conflicting_id.to_string(), indexed_start),
            Err(e) => {
                warn!(event_id = %conflicting_id, error = %e, "Could not load conflicting event");
                (conflicting_id.to_string(), indexed_start)
            }
        };
        SchedulerError::Conflict {
            event_id: conflicting_id.to_string(),
            title,
            start,
        }
    }
}

/// Sweep the start-ordered intervals for overlapping pairs
fn find_conflicts(index: &IntervalIndex) -> Vec<(String, String)> {
    let intervals: Vec<_> = index.iter().collect();
    let mut pairs = Vec::new();

    for (i, (start_a, end_a, id_a)) in intervals.iter().enumerate() {
        for (start_b, end_b, id_b) in &intervals[i + 1..] {
            if start_b >= end_a {
                break;
            }
            if start_a < end_b {
                pairs.push((id_a.to_string(), id_b.to_string()));
            }
        }
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Database, StoreResult};
    use crate::types::ScheduleRow;
    use chrono::{TimeDelta, TimeZone};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, hour, 0, 0).unwrap()
    }

    fn event(id: &str, hour: u32, hours: f64) -> Event {
        Event::new(id, format!("Event {}", id), at(hour), 10)
            .with_duration(hours)
            .created_by("user1")
    }

    /// Wraps a database and fails schedule writes on demand
    struct FlakyStore {
        inner: Database,
        fail_writes: AtomicBool,
    }

    impl FlakyStore {
        fn new() -> Self {
            Self {
                inner: Database::in_memory(),
                fail_writes: AtomicBool::new(false),
            }
        }

        fn check(&self) -> StoreResult<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("disk full".to_string()));
            }
            Ok(())
        }
    }

    impl ScheduleStore for FlakyStore {
        fn get_schedule(&self) -> StoreResult<Vec<ScheduleRow>> {
            self.inner.get_schedule()
        }

        fn add_schedule(&self, row: &ScheduleRow) -> StoreResult<()> {
            self.check()?;
            self.inner.add_schedule(row)
        }

        fn remove_schedule(&self, event_id: &str) -> StoreResult<bool> {
            self.check()?;
            self.inner.remove_schedule(event_id)
        }

        fn get_event(&self, event_id: &str) -> StoreResult<Option<Event>> {
            self.inner.get_event(event_id)
        }
    }

    fn setup() -> (Arc<Database>, Scheduler) {
        let db = Arc::new(Database::in_memory());
        let scheduler = Scheduler::new(db.clone()).unwrap();
        (db, scheduler)
    }

    #[test]
    fn test_schedule_persists_row() {
        let (db, scheduler) = setup();
        let a = event("a", 10, 2.0);
        db.add_event(&a).unwrap();

        let entry = scheduler.schedule_event(&a).unwrap();
        assert_eq!(entry.end, at(12));
        assert_eq!(db.get_schedule().unwrap(), vec![entry.to_row()]);
        assert!(scheduler.is_scheduled("a"));
    }

    #[test]
    fn test_conflict_names_existing_event() {
        let (db, scheduler) = setup();
        let a = event("a", 10, 2.0);
        db.add_event(&a).unwrap();
        scheduler.schedule_event(&a).unwrap();

        let err = scheduler.schedule_event(&event("b", 11, 2.0)).unwrap_err();
        match err {
            SchedulerError::Conflict { event_id, title, start } => {
                assert_eq!(event_id, "a");
                assert_eq!(title, "Event a");
                assert_eq!(start, at(10));
            }
            other => panic!("expected conflict, got {other:?}"),
        }
        assert!(!scheduler.is_scheduled("b"));
        assert_eq!(db.get_schedule().unwrap().len(), 1);
    }

    #[test]
    fn test_conflict_without_event_row_falls_back_to_id() {
        let (_db, scheduler) = setup();
        scheduler.schedule_event(&event("ghost", 10, 1.0)).unwrap();

        let err = scheduler.schedule_event(&event("b", 10, 1.0)).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::Conflict { ref title, .. } if title == "ghost"
        ));
    }

    #[test]
    fn test_back_to_back_events_fit() {
        let (_db, scheduler) = setup();
        scheduler.schedule_event(&event("a", 10, 2.0)).unwrap();
        scheduler.schedule_event(&event("b", 12, 1.0)).unwrap();
        scheduler.schedule_event(&event("c", 9, 1.0)).unwrap();
        assert_eq!(scheduler.entries().len(), 3);
        assert!(scheduler.conflicts().is_empty());
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let (_db, scheduler) = setup();
        let err = scheduler.schedule_event(&event("a", 10, -1.0)).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidDuration { .. }));
        assert!(scheduler.entries().is_empty());
    }

    #[test]
    fn test_double_schedule_rejected() {
        let (_db, scheduler) = setup();
        scheduler.schedule_event(&event("a", 10, 1.0)).unwrap();
        let err = scheduler.schedule_event(&event("a", 14, 1.0)).unwrap_err();
        assert!(matches!(err, SchedulerError::AlreadyScheduled(ref id) if id == "a"));
        assert_eq!(scheduler.entries().len(), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (db, scheduler) = setup();
        scheduler.schedule_event(&event("a", 10, 1.0)).unwrap();

        assert!(scheduler.remove_event("a").unwrap());
        assert!(!scheduler.remove_event("a").unwrap());
        assert!(!scheduler.remove_event("never").unwrap());
        assert!(db.get_schedule().unwrap().is_empty());
        assert_eq!(scheduler.queue_len(), 0);
    }

    #[test]
    fn test_failed_persist_rolls_back() {
        let store = Arc::new(FlakyStore::new());
        let scheduler = Scheduler::new(store.clone()).unwrap();
        scheduler.schedule_event(&event("a", 8, 1.0)).unwrap();

        store.fail_writes.store(true, Ordering::SeqCst);
        let before = scheduler.entries();
        let err = scheduler.schedule_event(&event("b", 10, 1.0)).unwrap_err();

        assert!(matches!(err, SchedulerError::Persistence(_)));
        assert_eq!(scheduler.entries(), before);
        assert_eq!(scheduler.queue_len(), 1);

        // the slot is free again once the store recovers
        store.fail_writes.store(false, Ordering::SeqCst);
        scheduler.schedule_event(&event("b", 10, 1.0)).unwrap();
    }

    #[test]
    fn test_failed_unpersist_restores_entry() {
        let store = Arc::new(FlakyStore::new());
        let scheduler = Scheduler::new(store.clone()).unwrap();
        scheduler.schedule_event(&event("a", 10, 1.0)).unwrap();

        store.fail_writes.store(true, Ordering::SeqCst);
        assert!(scheduler.remove_event("a").is_err());

        assert!(scheduler.is_scheduled("a"));
        assert_eq!(scheduler.queue_len(), 1);
        assert_eq!(store.get_schedule().unwrap().len(), 1);
    }

    #[test]
    fn test_next_event_prunes_past_entries() {
        let (_db, scheduler) = setup();
        scheduler.schedule_event(&event("nine", 9, 0.5)).unwrap();
        scheduler.schedule_event(&event("ten", 10, 0.5)).unwrap();
        scheduler.schedule_event(&event("eleven", 11, 0.5)).unwrap();

        let now = at(10) + TimeDelta::minutes(30);
        assert_eq!(scheduler.get_next_event(now), Some((at(11), "eleven".to_string())));
        assert_eq!(scheduler.get_next_event(at(8)), Some((at(11), "eleven".to_string())));
        assert_eq!(scheduler.get_next_event(at(12)), None);
    }

    #[test]
    fn test_startup_loads_persisted_rows() {
        let db = Arc::new(Database::in_memory());
        {
            let scheduler = Scheduler::new(db.clone()).unwrap();
            scheduler.schedule_event(&event("a", 14, 1.0)).unwrap();
            scheduler.schedule_event(&event("b", 10, 1.0)).unwrap();
        }

        let restarted = Scheduler::new(db).unwrap();
        assert_eq!(restarted.get_next_event(at(9)), Some((at(10), "b".to_string())));
        assert!(restarted.schedule_event(&event("c", 14, 0.5)).is_err());
    }

    #[test]
    fn test_startup_reports_overlapping_rows() {
        let db = Arc::new(Database::in_memory());
        for (id, start, end) in [("a", 10, 12), ("b", 11, 13), ("c", 13, 14)] {
            db.add_schedule(&ScheduleEntry::new(id, at(start), at(end)).to_row())
                .unwrap();
        }

        let scheduler = Scheduler::new(db).unwrap();
        assert_eq!(scheduler.entries().len(), 3);
        assert_eq!(scheduler.conflicts(), vec![("a".to_string(), "b".to_string())]);
    }
}
