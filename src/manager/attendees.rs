//! Attendee registration and export

use tracing::info;

use crate::store::{RegistrationOutcome, ScheduleStore};
use crate::types::{Attendee, Event};
use crate::utils::csv::attendees_to_csv;

use super::{EventManager, ManagerError, ManagerResult};

impl EventManager {
    /// Register `attendee` for an event, respecting its capacity
    ///
    /// Returns the event the attendee was registered for.
    pub fn register_attendee(&self, event_id: &str, attendee: Attendee) -> ManagerResult<Event> {
        let _guard = self.write_lock.lock();
        let event = self.require_event(event_id)?;

        self.db.add_attendee(&attendee)?;

        match self.db.register_attendee(event_id, &attendee.id)? {
            RegistrationOutcome::Registered => {
                info!(event_id = %event_id, attendee_id = %attendee.id, "Attendee registered");
                Ok(event)
            }
            RegistrationOutcome::EventNotFound => Err(ManagerError::NotFound(event_id.to_string())),
            RegistrationOutcome::EventFull => Err(ManagerError::EventFull(event_id.to_string())),
            RegistrationOutcome::AlreadyRegistered => Err(ManagerError::AlreadyRegistered {
                event_id: event_id.to_string(),
                attendee_id: attendee.id,
            }),
        }
    }

    pub fn attendees_for_event(&self, event_id: &str) -> ManagerResult<Vec<Attendee>> {
        self.require_event(event_id)?;
        Ok(self.db.list_attendees_for_event(event_id))
    }

    pub fn attendee_count(&self, event_id: &str) -> usize {
        self.db.attendee_count(event_id)
    }

    /// Attendee list as CSV (`ID,Name,Email`)
    pub fn export_attendees_csv(&self, event_id: &str) -> ManagerResult<String> {
        let attendees = self.attendees_for_event(event_id)?;
        Ok(attendees_to_csv(&attendees))
    }

    fn require_event(&self, event_id: &str) -> ManagerResult<Event> {
        self.db
            .get_event(event_id)?
            .ok_or_else(|| ManagerError::NotFound(event_id.to_string()))
    }
}
