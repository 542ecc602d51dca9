//! Persistence layer
//!
//! [`Database`] keeps users, events, attendees, registrations and schedule
//! rows. The scheduler only sees the narrow [`ScheduleStore`] contract so it
//! can be driven by any store (tests swap in failing ones).

mod database;

use crate::types::{Event, ScheduleRow};
use crate::utils::atomic::AtomicError;

pub use database::{Database, RegistrationOutcome, Table};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Write failed: {0}")]
    Atomic(#[from] AtomicError),
    #[error("Duplicate {table} key: {key}")]
    Duplicate { table: Table, key: String },
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// What the scheduler needs from persistence
pub trait ScheduleStore: Send + Sync {
    /// Every persisted schedule row, in no particular order
    fn get_schedule(&self) -> StoreResult<Vec<ScheduleRow>>;

    /// Insert a row; a row already present for the event is left as is
    fn add_schedule(&self, row: &ScheduleRow) -> StoreResult<()>;

    /// Delete the row for `event_id`, returning whether one existed
    fn remove_schedule(&self, event_id: &str) -> StoreResult<bool>;

    /// Look up an event record
    fn get_event(&self, event_id: &str) -> StoreResult<Option<Event>>;
}
