//! JSONL-backed relational store
//!
//! Each table lives in memory and is mirrored to `<data_dir>/<table>.jsonl`.
//! Every write snapshots the tables it touches, applies the change in place
//! and rewrites those table files atomically. A failed write puts the
//! snapshot back, so memory stays on the previous version.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::types::{Attendee, Event, Registration, ScheduleRow, User};
use crate::utils::atomic::{cleanup_temp_files, write_jsonl};

use super::{ScheduleStore, StoreError, StoreResult};

/// Tables held by the database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Users,
    Events,
    Attendees,
    Registrations,
    Schedule,
}

impl Table {
    /// File name inside the data directory
    pub fn file_name(&self) -> &'static str {
        match self {
            Table::Users => "users.jsonl",
            Table::Events => "events.jsonl",
            Table::Attendees => "attendees.jsonl",
            Table::Registrations => "registrations.jsonl",
            Table::Schedule => "schedule.jsonl",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Table::Users => write!(f, "users"),
            Table::Events => write!(f, "events"),
            Table::Attendees => write!(f, "attendees"),
            Table::Registrations => write!(f, "registrations"),
            Table::Schedule => write!(f, "schedule"),
        }
    }
}

/// Result of an attendee registration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered,
    EventNotFound,
    EventFull,
    AlreadyRegistered,
}

/// Outcome of a mutation closure passed to [`Database::write`]
enum Change<R> {
    /// Persist the mutated tables and return the value
    Commit(R),
    /// Nothing changed; drop the copy
    Skip(R),
}

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    events: Vec<Event>,
    attendees: Vec<Attendee>,
    registrations: Vec<Registration>,
    schedule: Vec<ScheduleRow>,
}

impl Tables {
    /// Copy of the listed tables; the others are left empty
    fn snapshot(&self, touched: &[Table]) -> Tables {
        let mut copy = Tables::default();
        for table in touched {
            match table {
                Table::Users => copy.users = self.users.clone(),
                Table::Events => copy.events = self.events.clone(),
                Table::Attendees => copy.attendees = self.attendees.clone(),
                Table::Registrations => copy.registrations = self.registrations.clone(),
                Table::Schedule => copy.schedule = self.schedule.clone(),
            }
        }
        copy
    }

    fn restore(&mut self, mut snapshot: Tables, touched: &[Table]) {
        for table in touched {
            match table {
                Table::Users => self.users = std::mem::take(&mut snapshot.users),
                Table::Events => self.events = std::mem::take(&mut snapshot.events),
                Table::Attendees => self.attendees = std::mem::take(&mut snapshot.attendees),
                Table::Registrations => {
                    self.registrations = std::mem::take(&mut snapshot.registrations)
                }
                Table::Schedule => self.schedule = std::mem::take(&mut snapshot.schedule),
            }
        }
    }
}

/// Durable store for users, events, attendees and schedule rows
pub struct Database {
    data_dir: Option<PathBuf>,
    tables: Mutex<Tables>,
}

impl Database {
    /// Open (or create) a database in `data_dir`
    pub fn open<P: AsRef<Path>>(data_dir: P) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;

        let cleaned = cleanup_temp_files(&data_dir)?;
        if cleaned > 0 {
            warn!(count = cleaned, "Removed leftover temp files from interrupted writes");
        }

        let tables = Tables {
            users: load_table(&data_dir, Table::Users)?,
            events: load_table(&data_dir, Table::Events)?,
            attendees: load_table(&data_dir, Table::Attendees)?,
            registrations: load_table(&data_dir, Table::Registrations)?,
            schedule: load_table(&data_dir, Table::Schedule)?,
        };

        info!(
            dir = %data_dir.display(),
            users = tables.users.len(),
            events = tables.events.len(),
            scheduled = tables.schedule.len(),
            "Database opened"
        );

        Ok(Self {
            data_dir: Some(data_dir),
            tables: Mutex::new(tables),
        })
    }

    /// Database that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            data_dir: None,
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Data directory, `None` for in-memory databases
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Apply `f` to the tables and persist the ones in `touched`
    ///
    /// The lock is held from the precondition checks inside `f` through the
    /// file writes, so check-then-write sequences are atomic. `f` may only
    /// modify tables listed in `touched`; those are rolled back on failure.
    fn write<R>(
        &self,
        touched: &[Table],
        f: impl FnOnce(&mut Tables) -> StoreResult<Change<R>>,
    ) -> StoreResult<R> {
        let mut guard = self.tables.lock();
        let snapshot = guard.snapshot(touched);

        let result = f(&mut *guard).and_then(|change| match change {
            Change::Skip(result) => Ok(result),
            Change::Commit(result) => {
                if let Some(ref dir) = self.data_dir {
                    for table in touched {
                        persist_table(dir, &*guard, *table)?;
                    }
                }
                Ok(result)
            }
        });

        if result.is_err() {
            guard.restore(snapshot, touched);
        }
        result
    }

    /// Insert a user; ids and emails are unique
    pub fn add_user(&self, user: User) -> StoreResult<()> {
        debug!(user = %user.email, "Adding user");
        self.write(&[Table::Users], |t| {
            if let Some(existing) = t
                .users
                .iter()
                .find(|u| u.id == user.id || u.email == user.email)
            {
                let key = if existing.email == user.email {
                    user.email.clone()
                } else {
                    user.id.clone()
                };
                return Err(StoreError::Duplicate {
                    table: Table::Users,
                    key,
                });
            }
            t.users.push(user);
            Ok(Change::Commit(()))
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Option<User> {
        self.tables
            .lock()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
    }

    /// Insert an event; returns `false` if the id is already taken
    pub fn add_event(&self, event: &Event) -> StoreResult<bool> {
        self.write(&[Table::Events], |t| {
            if t.events.iter().any(|e| e.id == event.id) {
                return Ok(Change::Skip(false));
            }
            t.events.push(event.clone());
            Ok(Change::Commit(true))
        })
    }

    pub fn list_events(&self) -> Vec<Event> {
        self.tables.lock().events.clone()
    }

    /// Replace the stored row for `event.id`; returns `false` if absent
    pub fn update_event(&self, event: &Event) -> StoreResult<bool> {
        self.write(&[Table::Events], |t| {
            match t.events.iter_mut().find(|e| e.id == event.id) {
                Some(slot) => {
                    *slot = event.clone();
                    Ok(Change::Commit(true))
                }
                None => Ok(Change::Skip(false)),
            }
        })
    }

    /// Delete an event with its registrations and schedule row
    pub fn delete_event(&self, event_id: &str) -> StoreResult<bool> {
        self.write(
            &[Table::Registrations, Table::Schedule, Table::Events],
            |t| {
                if !t.events.iter().any(|e| e.id == event_id) {
                    return Ok(Change::Skip(false));
                }
                t.registrations.retain(|r| r.event_id != event_id);
                t.schedule.retain(|r| r.event_id != event_id);
                t.events.retain(|e| e.id != event_id);
                Ok(Change::Commit(true))
            },
        )
    }

    /// Insert an attendee unless the id already exists
    pub fn add_attendee(&self, attendee: &Attendee) -> StoreResult<bool> {
        self.write(&[Table::Attendees], |t| {
            if t.attendees.iter().any(|a| a.id == attendee.id) {
                return Ok(Change::Skip(false));
            }
            t.attendees.push(attendee.clone());
            Ok(Change::Commit(true))
        })
    }

    /// Register an attendee, enforcing the event's capacity
    pub fn register_attendee(
        &self,
        event_id: &str,
        attendee_id: &str,
    ) -> StoreResult<RegistrationOutcome> {
        self.write(&[Table::Registrations], |t| {
            let Some(capacity) = t
                .events
                .iter()
                .find(|e| e.id == event_id)
                .map(|e| e.capacity as usize)
            else {
                return Ok(Change::Skip(RegistrationOutcome::EventNotFound));
            };

            if t
                .registrations
                .iter()
                .any(|r| r.event_id == event_id && r.attendee_id == attendee_id)
            {
                return Ok(Change::Skip(RegistrationOutcome::AlreadyRegistered));
            }

            let registered = t
                .registrations
                .iter()
                .filter(|r| r.event_id == event_id)
                .count();
            if registered >= capacity {
                return Ok(Change::Skip(RegistrationOutcome::EventFull));
            }

            t.registrations.push(Registration {
                event_id: event_id.to_string(),
                attendee_id: attendee_id.to_string(),
            });
            Ok(Change::Commit(RegistrationOutcome::Registered))
        })
    }

    pub fn attendee_count(&self, event_id: &str) -> usize {
        self.tables
            .lock()
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .count()
    }

    /// Attendees registered for an event, in registration order
    pub fn list_attendees_for_event(&self, event_id: &str) -> Vec<Attendee> {
        let tables = self.tables.lock();
        tables
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .filter_map(|r| tables.attendees.iter().find(|a| a.id == r.attendee_id))
            .cloned()
            .collect()
    }
}

impl ScheduleStore for Database {
    fn get_schedule(&self) -> StoreResult<Vec<ScheduleRow>> {
        Ok(self.tables.lock().schedule.clone())
    }

    fn add_schedule(&self, row: &ScheduleRow) -> StoreResult<()> {
        self.write(&[Table::Schedule], |t| {
            if t.schedule.iter().any(|r| r.event_id == row.event_id) {
                return Ok(Change::Skip(()));
            }
            t.schedule.push(row.clone());
            Ok(Change::Commit(()))
        })
    }

    fn remove_schedule(&self, event_id: &str) -> StoreResult<bool> {
        self.write(&[Table::Schedule], |t| {
            let before = t.schedule.len();
            t.schedule.retain(|r| r.event_id != event_id);
            if t.schedule.len() == before {
                Ok(Change::Skip(false))
            } else {
                Ok(Change::Commit(true))
            }
        })
    }

    fn get_event(&self, event_id: &str) -> StoreResult<Option<Event>> {
        Ok(self
            .tables
            .lock()
            .events
            .iter()
            .find(|e| e.id == event_id)
            .cloned())
    }
}

fn persist_table(dir: &Path, tables: &Tables, table: Table) -> StoreResult<()> {
    let path = dir.join(table.file_name());
    match table {
        Table::Users => write_jsonl(path, &tables.users)?,
        Table::Events => write_jsonl(path, &tables.events)?,
        Table::Attendees => write_jsonl(path, &tables.attendees)?,
        Table::Registrations => write_jsonl(path, &tables.registrations)?,
        Table::Schedule => write_jsonl(path, &tables.schedule)?,
    }
    Ok(())
}

/// Load one table file, skipping (and logging) lines that fail to parse
fn load_table<T: DeserializeOwned>(dir: &Path, table: Table) -> StoreResult<Vec<T>> {
    let path = dir.join(table.file_name());
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(&path)?);
    let mut rows = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(row) => rows.push(row),
            Err(e) => warn!(
                table = %table,
                line = line_num + 1,
                error = %e,
                "Skipping unreadable row"
            ),
        }
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn event(id: &str, capacity: u32) -> Event {
        Event::new(id, "Workshop", Utc.with_ymd_and_hms(2025, 5, 1, 10, 0, 0).unwrap(), capacity)
            .created_by("user1")
    }

    fn user(id: &str, email: &str) -> User {
        User {
            id: id.to_string(),
            name: "Test".to_string(),
            email: email.to_string(),
            password: "hash".to_string(),
            role: Role::Organizer,
        }
    }

    #[test]
    fn test_add_event_ignores_duplicate_id() {
        let db = Database::in_memory();
        assert!(db.add_event(&event("e1", 10)).unwrap());
        assert!(!db.add_event(&event("e1", 20)).unwrap());
        assert_eq!(db.get_event("e1").unwrap().unwrap().capacity, 10);
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let db = Database::in_memory();
        db.add_user(user("u1", "a@example.com")).unwrap();
        let err = db.add_user(user("u2", "a@example.com")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { table: Table::Users, .. }));
    }

    #[test]
    fn test_registration_respects_capacity() {
        let db = Database::in_memory();
        db.add_event(&event("e1", 1)).unwrap();
        db.add_attendee(&Attendee::new("a1", "Ada", "ada@example.com")).unwrap();
        db.add_attendee(&Attendee::new("a2", "Bob", "bob@example.com")).unwrap();

        assert_eq!(db.register_attendee("e1", "a1").unwrap(), RegistrationOutcome::Registered);
        assert_eq!(
            db.register_attendee("e1", "a1").unwrap(),
            RegistrationOutcome::AlreadyRegistered
        );
        assert_eq!(db.register_attendee("e1", "a2").unwrap(), RegistrationOutcome::EventFull);
        assert_eq!(
            db.register_attendee("missing", "a2").unwrap(),
            RegistrationOutcome::EventNotFound
        );
        assert_eq!(db.attendee_count("e1"), 1);
    }

    #[test]
    fn test_delete_event_cascades() {
        let db = Database::in_memory();
        db.add_event(&event("e1", 5)).unwrap();
        db.add_attendee(&Attendee::new("a1", "Ada", "ada@example.com")).unwrap();
        db.register_attendee("e1", "a1").unwrap();
        db.add_schedule(&ScheduleRow {
            event_id: "e1".to_string(),
            start_ts: 0.0,
            end_ts: 3600.0,
        })
        .unwrap();

        assert!(db.delete_event("e1").unwrap());
        assert!(db.get_event("e1").unwrap().is_none());
        assert!(db.get_schedule().unwrap().is_empty());
        assert_eq!(db.attendee_count("e1"), 0);
        assert!(!db.delete_event("e1").unwrap());
    }

    #[test]
    fn test_add_schedule_is_idempotent() {
        let db = Database::in_memory();
        let row = ScheduleRow {
            event_id: "e1".to_string(),
            start_ts: 10.0,
            end_ts: 20.0,
        };
        db.add_schedule(&row).unwrap();
        db.add_schedule(&ScheduleRow { start_ts: 30.0, end_ts: 40.0, ..row.clone() })
            .unwrap();

        assert_eq!(db.get_schedule().unwrap(), vec![row]);
        assert!(db.remove_schedule("e1").unwrap());
        assert!(!db.remove_schedule("e1").unwrap());
    }

    #[test]
    fn test_tables_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let db = Database::open(temp_dir.path()).unwrap();
            db.add_user(user("u1", "a@example.com")).unwrap();
            db.add_event(&event("e1", 5)).unwrap();
            db.add_schedule(&ScheduleRow {
                event_id: "e1".to_string(),
                start_ts: 1.5,
                end_ts: 2.5,
            })
            .unwrap();
        }

        let db = Database::open(temp_dir.path()).unwrap();
        assert!(db.get_user_by_email("a@example.com").is_some());
        assert_eq!(db.list_events().len(), 1);
        assert_eq!(db.get_schedule().unwrap()[0].start_ts, 1.5);
    }

    #[test]
    fn test_failed_persist_keeps_previous_rows() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open(temp_dir.path()).unwrap();
        db.add_event(&event("e1", 5)).unwrap();

        // A directory on the temp path makes the events table unwritable
        let blocker = temp_dir.path().join("events.tmp");
        std::fs::create_dir(&blocker).unwrap();
        assert!(db.add_event(&event("e2", 5)).is_err());
        let mut changed = event("e1", 50);
        changed.title = "Changed".to_string();
        assert!(db.update_event(&changed).is_err());

        assert_eq!(db.list_events().len(), 1);
        assert_eq!(db.get_event("e1").unwrap().unwrap().capacity, 5);

        std::fs::remove_dir(&blocker).unwrap();
        assert!(db.add_event(&event("e2", 5)).unwrap());
        assert_eq!(db.list_events().len(), 2);
    }

    #[test]
    fn test_unreadable_rows_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(Table::Schedule.file_name()),
            "{\"event_id\":\"e1\",\"start_ts\":1.0,\"end_ts\":2.0}\nnot json\n",
        )
        .unwrap();

        let db = Database::open(temp_dir.path()).unwrap();
        assert_eq!(db.get_schedule().unwrap().len(), 1);
    }
}
