//! Event manager - CRUD facade over events and registrations
//!
//! Every mutation writes the event row first and then brings the
//! [`Scheduler`] in line with it, so the scheduler always reflects committed
//! event data. Deletion is the exception: the slot is released before the
//! row goes away, leaving no schedule row pointing at a deleted event.
//!
//! Mutations run under one manager-wide lock, so a row and its slot always
//! change together.

mod attendees;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::scheduler::{Scheduler, SchedulerError};
use crate::store::{Database, ScheduleStore, StoreError};
use crate::types::{Event, EventUpdate};

/// Result type for manager operations
pub type ManagerResult<T> = Result<T, ManagerError>;

/// Errors surfaced by the event manager
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("Event {0} not found")]
    NotFound(String),
    #[error("Event ID {0} already exists")]
    AlreadyExists(String),
    #[error("{0}")]
    Validation(String),
    #[error("Event {0} is full")]
    EventFull(String),
    #[error("Attendee {attendee_id} is already registered for {event_id}")]
    AlreadyRegistered {
        event_id: String,
        attendee_id: String,
    },
    #[error(transparent)]
    Scheduling(#[from] SchedulerError),
    /// The event row was updated but the new timing could not be scheduled.
    /// The event currently holds no slot; `previous` allows a rollback.
    #[error("Event {} was updated but could not be rescheduled: {source}", .event.id)]
    Unscheduled {
        event: Box<Event>,
        previous: Box<Event>,
        #[source]
        source: SchedulerError,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// CRUD facade that keeps the scheduler in step with the event table
pub struct EventManager {
    pub(crate) db: Arc<Database>,
    pub(crate) scheduler: Arc<Scheduler>,
    write_lock: Mutex<()>,
}

impl EventManager {
    pub fn new(db: Arc<Database>, scheduler: Arc<Scheduler>) -> Self {
        Self {
            db,
            scheduler,
            write_lock: Mutex::new(()),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Store a new event and reserve its slot
    ///
    /// On a scheduling conflict the freshly inserted row is removed again.
    pub fn add_event(&self, event: Event) -> ManagerResult<Event> {
        validate(&event)?;
        let _guard = self.write_lock.lock();

        if !self.db.add_event(&event)? {
            return Err(ManagerError::AlreadyExists(event.id));
        }

        if let Err(e) = self.scheduler.schedule_event(&event) {
            if let Err(cleanup) = self.db.delete_event(&event.id) {
                warn!(event_id = %event.id, error = %cleanup, "Could not remove unscheduled event row");
            }
            return Err(e.into());
        }

        info!(event_id = %event.id, created_by = %event.created_by, "Event created");
        Ok(event)
    }

    pub fn get_event(&self, event_id: &str) -> ManagerResult<Option<Event>> {
        Ok(self.db.get_event(event_id)?)
    }

    /// All events ordered by start
    pub fn list_events(&self) -> Vec<Event> {
        let mut events = self.db.list_events();
        events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        events
    }

    /// Apply `update`, rescheduling when the date or duration changes
    ///
    /// A reschedule that conflicts returns [`ManagerError::Unscheduled`]; the
    /// row keeps the new values and the event holds no slot until the caller
    /// either accepts that or calls [`EventManager::restore_event`].
    pub fn update_event(&self, event_id: &str, update: EventUpdate) -> ManagerResult<Event> {
        let _guard = self.write_lock.lock();
        self.apply_update(event_id, update)
    }

    /// Apply `update`, putting the previous version back if the new timing
    /// cannot be scheduled
    ///
    /// The rollback happens before the lock is released, so the old slot
    /// cannot be taken in between. The scheduling error is returned.
    pub fn update_event_or_rollback(
        &self,
        event_id: &str,
        update: EventUpdate,
    ) -> ManagerResult<Event> {
        let _guard = self.write_lock.lock();
        match self.apply_update(event_id, update) {
            Err(ManagerError::Unscheduled { previous, source, .. }) => {
                if let Err(e) = self.put_back(&previous) {
                    error!(event_id = %event_id, error = %e, "Could not roll back failed reschedule");
                    return Err(e);
                }
                Err(source.into())
            }
            other => other,
        }
    }

    /// Put back an earlier version of an event, row and slot
    pub fn restore_event(&self, previous: &Event) -> ManagerResult<()> {
        let _guard = self.write_lock.lock();
        self.put_back(previous)
    }

    /// Release the slot, then delete the row and its registrations
    pub fn delete_event(&self, event_id: &str) -> ManagerResult<bool> {
        let _guard = self.write_lock.lock();
        if self.get_event(event_id)?.is_none() {
            return Ok(false);
        }

        self.scheduler.remove_event(event_id)?;
        let deleted = self.db.delete_event(event_id)?;
        if deleted {
            info!(event_id = %event_id, "Event deleted");
        }
        Ok(deleted)
    }

    /// Next scheduled event starting at or after `now`
    ///
    /// Slots whose event row has vanished are released on the way.
    pub fn next_event(&self, now: DateTime<Utc>) -> ManagerResult<Option<(DateTime<Utc>, Event)>> {
        let _guard = self.write_lock.lock();
        while let Some((start, event_id)) = self.scheduler.get_next_event(now) {
            match self.get_event(&event_id)? {
                Some(event) => return Ok(Some((start, event))),
                None => {
                    warn!(event_id = %event_id, "Dropping slot of missing event");
                    self.scheduler.remove_event(&event_id)?;
                }
            }
        }
        Ok(None)
    }

    /// Caller holds `write_lock`
    fn apply_update(&self, event_id: &str, update: EventUpdate) -> ManagerResult<Event> {
        let previous = self
            .get_event(event_id)?
            .ok_or_else(|| ManagerError::NotFound(event_id.to_string()))?;

        let updated = update.apply(&previous);
        validate(&updated)?;
        let registered = self.db.attendee_count(event_id);
        if (updated.capacity as usize) < registered {
            return Err(ManagerError::Validation(format!(
                "Capacity {} is below the {} registered attendees",
                updated.capacity, registered
            )));
        }

        if !self.db.update_event(&updated)? {
            return Err(ManagerError::NotFound(event_id.to_string()));
        }

        if update.changes_timing(&previous) {
            if let Err(source) = self.scheduler.remove_event(event_id) {
                // The old slot is still held, so the old row goes back with it
                if let Err(e) = self.db.update_event(&previous) {
                    error!(event_id = %event_id, error = %e, "Could not restore event row");
                }
                return Err(source.into());
            }
            if let Err(source) = self.scheduler.schedule_event(&updated) {
                warn!(event_id = %event_id, error = %source, "Updated event left unscheduled");
                return Err(ManagerError::Unscheduled {
                    event: Box::new(updated),
                    previous: Box::new(previous),
                    source,
                });
            }
        }

        info!(event_id = %event_id, "Event updated");
        Ok(updated)
    }

    /// Caller holds `write_lock`
    fn put_back(&self, previous: &Event) -> ManagerResult<()> {
        if !self.db.update_event(previous)? {
            return Err(ManagerError::NotFound(previous.id.clone()));
        }
        self.scheduler.remove_event(&previous.id)?;
        self.scheduler.schedule_event(previous)?;
        info!(event_id = %previous.id, "Event restored to previous version");
        Ok(())
    }
}

fn validate(event: &Event) -> ManagerResult<()> {
    if event.id.trim().is_empty() {
        return Err(ManagerError::Validation("Event ID must not be empty".to_string()));
    }
    if event.title.trim().is_empty() {
        return Err(ManagerError::Validation("Title must not be empty".to_string()));
    }
    if event.capacity == 0 {
        return Err(ManagerError::Validation("Capacity must be positive".to_string()));
    }
    if event.end().is_none() {
        return Err(ManagerError::Validation(
            "Duration must be a non-negative number of hours".to_string(),
        ));
    }
    Ok(())
}
