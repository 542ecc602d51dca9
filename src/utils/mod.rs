//! Utility functions and helpers
//!
//! Date parsing and epoch conversion, atomic table writes and CSV export.

pub mod atomic;
pub mod csv;
pub mod time;

pub use time::{from_epoch_seconds, hours_to_delta, parse_date, to_epoch_seconds, InvalidDate};
