//! Data types for the event manager
//!
//! This module contains the core records shared by the store, the scheduler
//! and the HTTP layer.

mod attendee;
mod event;
mod schedule;
mod user;

pub use attendee::{Attendee, Registration};
pub use event::{Event, EventKind, EventUpdate};
pub use schedule::{ScheduleEntry, ScheduleRow};
pub use user::{Role, User};
