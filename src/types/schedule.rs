//! Schedule types
//!
//! [`ScheduleEntry`] is the in-memory view of an event's reserved slot;
//! [`ScheduleRow`] is its persisted mirror with epoch-second timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::time::{from_epoch_seconds, to_epoch_seconds};

/// Reserved half-open slot `[start, end)` for one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub event_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ScheduleEntry {
    pub fn new(event_id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            event_id: event_id.into(),
            start,
            end,
        }
    }

    /// Whether the two slots share any instant
    pub fn overlaps(&self, other: &ScheduleEntry) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Convert to the persisted representation
    pub fn to_row(&self) -> ScheduleRow {
        ScheduleRow {
            event_id: self.event_id.clone(),
            start_ts: to_epoch_seconds(self.start),
            end_ts: to_epoch_seconds(self.end),
        }
    }
}

/// Row of the `schedule` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub event_id: String,
    pub start_ts: f64,
    pub end_ts: f64,
}

impl ScheduleRow {
    /// Convert back to an entry; `None` if a timestamp is out of range
    pub fn to_entry(&self) -> Option<ScheduleEntry> {
        let start = from_epoch_seconds(self.start_ts)?;
        let end = from_epoch_seconds(self.end_ts)?;
        Some(ScheduleEntry::new(self.event_id.clone(), start, end))
    }
}
