//! REST API module for HTTP endpoints
//!
//! - `POST /register`, `POST /login`, `POST /refresh` - Accounts and tokens
//! - `GET|POST /events`, `GET|PUT|DELETE /events/:id` - Event CRUD
//! - `POST /events/:id/register` - Attendee registration
//! - `GET /events/:id/attendees/export` - Attendee CSV
//! - `GET /scheduler/next` - Next scheduled event

pub mod attendees;
pub mod auth;
pub mod events;
pub mod scheduler;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::auth::AuthError;
use crate::manager::ManagerError;
use crate::scheduler::SchedulerError;
use crate::utils::InvalidDate;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Empty `data` object
#[derive(Debug, Serialize)]
pub struct Empty {}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.to_string(),
            status,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "CONFLICT", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Forbidden(msg) => ApiError::forbidden(msg),
            AuthError::UserExists => ApiError::bad_request(err.to_string()),
            AuthError::InvalidCredentials
            | AuthError::TokenError(_)
            | AuthError::TokenExpired
            | AuthError::InvalidTokenType
            | AuthError::UserNotFound
            | AuthError::MissingToken => ApiError::unauthorized(err.to_string()),
            AuthError::HashError(_)
            | AuthError::InvalidSecret(_)
            | AuthError::Config(_)
            | AuthError::Store(_) => {
                error!(error = %err, "Authentication backend failure");
                ApiError::internal(err.to_string())
            }
        }
    }
}

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::Conflict { .. } | SchedulerError::AlreadyScheduled(_) => {
                ApiError::conflict(err.to_string())
            }
            SchedulerError::InvalidDuration { .. } => ApiError::bad_request(err.to_string()),
            SchedulerError::Persistence(_) => {
                error!(error = %err, "Schedule persistence failure");
                ApiError::internal(err.to_string())
            }
        }
    }
}

impl From<ManagerError> for ApiError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::NotFound(_) => ApiError::not_found(err.to_string()),
            ManagerError::AlreadyExists(_)
            | ManagerError::Validation(_)
            | ManagerError::EventFull(_)
            | ManagerError::AlreadyRegistered { .. } => ApiError::bad_request(err.to_string()),
            ManagerError::Scheduling(source) | ManagerError::Unscheduled { source, .. } => {
                source.into()
            }
            ManagerError::Store(_) => {
                error!(error = %err, "Store failure");
                ApiError::internal(err.to_string())
            }
        }
    }
}

impl From<InvalidDate> for ApiError {
    fn from(err: InvalidDate) -> Self {
        ApiError::bad_request(err.to_string())
    }
}
