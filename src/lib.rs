//! Event Manager API
//!
//! An HTTP API for events, attendees and user accounts, with JWT
//! authentication and a scheduler that keeps events from overlapping.
//!
//! # Features
//!
//! - **Conflict-free timeline**: half-open `[start, end)` slots in an interval index
//! - **Lookahead**: min-heap answering "what happens next"
//! - **Durable**: schedule rows persisted alongside events, reloaded on start
//! - **Auth**: bcrypt passwords, access/refresh JWTs, role checks
//!
//! # Modules
//!
//! - `types`: Core records (Event, ScheduleEntry, User, Attendee)
//! - `store`: JSONL-backed tables and the `ScheduleStore` contract
//! - `scheduler`: Interval index, lookahead queue and the `Scheduler`
//! - `manager`: Event CRUD, attendee registration and CSV export
//! - `auth`: JWT issue/validation and permission checks
//! - `api`: axum router and handlers
//! - `config`: Environment-driven configuration
//! - `utils`: Date parsing, atomic writes, CSV
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::Utc;
//! use event_manager::{Database, Event, EventManager, Scheduler};
//!
//! fn main() -> anyhow::Result<()> {
//!     let db = Arc::new(Database::open("data")?);
//!     let scheduler = Arc::new(Scheduler::new(db.clone())?);
//!     let manager = EventManager::new(db, scheduler);
//!
//!     let event = Event::new("e1", "Rust Workshop", Utc::now(), 50).with_duration(2.0);
//!     manager.add_event(event)?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod manager;
pub mod scheduler;
pub mod store;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use api::{create_router, AppState};
pub use auth::{AuthError, JwtAuth};
pub use config::AppConfig;
pub use manager::{EventManager, ManagerError};
pub use scheduler::{Scheduler, SchedulerError};
pub use store::{Database, ScheduleStore, StoreError};
pub use types::{
    Attendee, Event, EventKind, EventUpdate, Registration, Role, ScheduleEntry, ScheduleRow, User,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
