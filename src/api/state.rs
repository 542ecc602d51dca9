//! Shared application state

use std::sync::Arc;

use crate::auth::JwtAuth;
use crate::manager::EventManager;
use crate::scheduler::{Scheduler, SchedulerError};
use crate::store::Database;

/// Shared application state for HTTP handlers
pub struct AppState {
    /// Tables for users, events and attendees
    pub db: Arc<Database>,

    /// Event CRUD plus the scheduler it drives
    pub manager: Arc<EventManager>,

    /// Token issue and validation
    pub auth: Arc<JwtAuth>,

    /// Origins allowed by the CORS layer
    pub cors_origins: Vec<String>,
}

impl AppState {
    /// Build the scheduler from the persisted schedule and wire the manager
    pub fn new(db: Arc<Database>, auth: JwtAuth) -> Result<Self, SchedulerError> {
        let scheduler = Arc::new(Scheduler::new(db.clone())?);
        let manager = Arc::new(EventManager::new(db.clone(), scheduler));

        Ok(Self {
            db,
            manager,
            auth: Arc::new(auth),
            cors_origins: Vec::new(),
        })
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }
}
