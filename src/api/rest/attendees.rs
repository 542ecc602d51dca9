//! Attendee endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiError, ApiResponse};
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::auth::check_event_permission;
use crate::types::Attendee;

/// Body of `POST /events/:id/register`
#[derive(Debug, Deserialize)]
pub struct RegisterAttendeeRequest {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct RegisteredAttendee {
    pub attendee_id: String,
}

/// POST /events/:id/register - Register an attendee
pub async fn register_attendee(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
    Json(request): Json<RegisterAttendeeRequest>,
) -> Result<Json<ApiResponse<RegisteredAttendee>>, ApiError> {
    let attendee = Attendee::new(request.id, request.name, request.email);
    let name = attendee.name.clone();
    let attendee_id = attendee.id.clone();

    let event = state.manager.register_attendee(&event_id, attendee)?;
    Ok(Json(ApiResponse::new(
        format!("{} registered for {}", name, event.title),
        RegisteredAttendee { attendee_id },
    )))
}

/// GET /events/:id/attendees/export - Attendee list as CSV (creator or admin)
pub async fn export_attendees(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let event = state
        .manager
        .get_event(&event_id)?
        .ok_or_else(|| ApiError::not_found("Event not found"))?;
    check_event_permission(&event, &user)?;

    let csv = state.manager.export_attendees_csv(&event_id)?;
    info!(event_id = %event_id, user = %user.id, "Attendees exported");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=attendees.csv"),
        ],
        csv,
    ))
}
