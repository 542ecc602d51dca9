//! HTTP API
//!
//! axum router over the event manager, accounts and scheduler.

mod extract;
pub mod http;
pub mod rest;
mod state;

pub use extract::CurrentUser;
pub use http::create_router;
pub use rest::{ApiError, ApiResponse};
pub use state::AppState;
