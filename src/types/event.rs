//! Event types for the event manager
//!
//! An [`Event`] is the durable record owned by a user. Its reserved time slot
//! is derived from `date` and `duration_hours` (see [`super::ScheduleEntry`]).

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::time::hours_to_delta;

/// Kind of event offered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    #[default]
    Basic,
    Premium,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventKind::Basic => write!(f, "basic"),
            EventKind::Premium => write!(f, "premium"),
        }
    }
}

fn default_duration() -> f64 {
    1.0
}

/// Event record as stored in the `events` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    /// Start of the event
    pub date: DateTime<Utc>,
    pub capacity: u32,
    #[serde(default = "default_duration")]
    pub duration_hours: f64,
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor: Option<String>,
    /// Id of the organizer who created the event
    pub created_by: String,
}

impl Event {
    /// Create a one hour basic event
    pub fn new(id: impl Into<String>, title: impl Into<String>, date: DateTime<Utc>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            date,
            capacity,
            duration_hours: default_duration(),
            kind: EventKind::Basic,
            instructor: None,
            created_by: String::new(),
        }
    }

    /// Builder-style duration setter
    pub fn with_duration(mut self, hours: f64) -> Self {
        self.duration_hours = hours;
        self
    }

    /// Builder-style owner setter
    pub fn created_by(mut self, user_id: impl Into<String>) -> Self {
        self.created_by = user_id.into();
        self
    }

    /// Duration as a chrono delta, `None` when negative or not finite
    pub fn duration(&self) -> Option<TimeDelta> {
        hours_to_delta(self.duration_hours)
    }

    /// End of the reserved slot, `None` when the duration is invalid
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.duration().and_then(|d| self.date.checked_add_signed(d))
    }

    /// Human readable one-line description
    pub fn display_details(&self) -> String {
        format!(
            "Event: {}, Date: {}, Capacity: {}, Duration: {} hours",
            self.title,
            self.date.format("%Y-%m-%d %H:%M:%S"),
            self.capacity,
            self.duration_hours
        )
    }
}

/// Partial update for an event; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub capacity: Option<u32>,
    pub duration_hours: Option<f64>,
    pub kind: Option<EventKind>,
    pub instructor: Option<String>,
}

impl EventUpdate {
    /// Whether applying this update moves the event's time slot
    pub fn changes_timing(&self, event: &Event) -> bool {
        self.date.is_some_and(|d| d != event.date)
            || self.duration_hours.is_some_and(|h| h != event.duration_hours)
    }

    /// Apply the update to a copy of `event`
    pub fn apply(&self, event: &Event) -> Event {
        let mut updated = event.clone();
        if let Some(ref title) = self.title {
            updated.title = title.clone();
        }
        if let Some(date) = self.date {
            updated.date = date;
        }
        if let Some(capacity) = self.capacity {
            updated.capacity = capacity;
        }
        if let Some(hours) = self.duration_hours {
            updated.duration_hours = hours;
        }
        if let Some(kind) = self.kind {
            updated.kind = kind;
        }
        if let Some(ref instructor) = self.instructor {
            updated.instructor = Some(instructor.clone());
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_end_from_duration() {
        let event = Event::new("e1", "Workshop", at(10), 20).with_duration(2.5);
        assert_eq!(event.end(), Some(at(12) + TimeDelta::minutes(30)));
    }

    #[test]
    fn test_negative_duration_has_no_end() {
        let event = Event::new("e1", "Workshop", at(10), 20).with_duration(-1.0);
        assert!(event.end().is_none());
    }

    #[test]
    fn test_kind_serializes_as_type() {
        let event = Event::new("e1", "Workshop", at(10), 20);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "basic");
        assert!(json.get("instructor").is_none());
    }

    #[test]
    fn test_update_changes_timing() {
        let event = Event::new("e1", "Workshop", at(10), 20);

        let rename = EventUpdate {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        assert!(!rename.changes_timing(&event));
        assert_eq!(rename.apply(&event).title, "Renamed");

        let same_date = EventUpdate {
            date: Some(at(10)),
            ..Default::default()
        };
        assert!(!same_date.changes_timing(&event));

        let moved = EventUpdate {
            date: Some(at(13)),
            ..Default::default()
        };
        assert!(moved.changes_timing(&event));
        assert_eq!(moved.apply(&event).date, at(13));
    }
}
