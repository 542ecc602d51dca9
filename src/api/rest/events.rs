//! Event endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ApiError, ApiResponse, Empty};
use crate::api::extract::CurrentUser;
use crate::api::state::AppState;
use crate::auth::{check_event_permission, require_organizer};
use crate::types::{Event, EventKind, EventUpdate};
use crate::utils::parse_date;

fn default_duration() -> f64 {
    1.0
}

/// Body of `POST /events`
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub id: String,
    pub title: String,
    pub date: String,
    pub capacity: i64,
    #[serde(default = "default_duration")]
    pub duration_hours: f64,
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    pub instructor: Option<String>,
}

/// Body of `PUT /events/:id`
#[derive(Debug, Default, Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub date: Option<String>,
    pub capacity: Option<i64>,
    pub duration_hours: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<EventKind>,
    pub instructor: Option<String>,
}

/// Row of `GET /events`
#[derive(Debug, Serialize)]
pub struct EventSummary {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
}

impl From<&Event> for EventSummary {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            date: event.date,
        }
    }
}

/// Full event plus its one-line description
#[derive(Debug, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub details: String,
}

impl From<Event> for EventDetail {
    fn from(event: Event) -> Self {
        let details = event.display_details();
        Self { event, details }
    }
}

fn positive_capacity(capacity: i64) -> Result<u32, ApiError> {
    if capacity <= 0 {
        return Err(ApiError::bad_request("Capacity must be positive"));
    }
    u32::try_from(capacity).map_err(|_| ApiError::bad_request("Capacity is too large"))
}

fn require_event(state: &AppState, event_id: &str) -> Result<Event, ApiError> {
    state
        .manager
        .get_event(event_id)?
        .ok_or_else(|| ApiError::not_found("Event not found"))
}

/// GET / - Welcome message
pub async fn root() -> Json<ApiResponse<Empty>> {
    Json(ApiResponse::new("Welcome to Event Management API", Empty {}))
}

/// POST /events - Create and schedule an event (organizers only)
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EventDetail>>), ApiError> {
    require_organizer(&user)?;
    let capacity = positive_capacity(request.capacity)?;
    let date = parse_date(&request.date)?;

    let mut event = Event::new(request.id, request.title, date, capacity)
        .with_duration(request.duration_hours)
        .created_by(user.id.as_str());
    event.kind = request.kind;
    event.instructor = request.instructor;

    let event = state.manager.add_event(event)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Event created", event.into())),
    ))
}

/// GET /events - List events by start
pub async fn list_events(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Vec<EventSummary>>> {
    let events = state.manager.list_events();
    let data = events.iter().map(EventSummary::from).collect();
    Json(ApiResponse::new("Events retrieved", data))
}

/// GET /events/:id - Single event
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<ApiResponse<EventDetail>>, ApiError> {
    let event = require_event(&state, &event_id)?;
    Ok(Json(ApiResponse::new("Event retrieved", event.into())))
}

/// PUT /events/:id - Update an event (creator or admin)
///
/// A new timing that collides with another event is rolled back and
/// reported as a conflict.
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<String>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<ApiResponse<EventDetail>>, ApiError> {
    let event = require_event(&state, &event_id)?;
    check_event_permission(&event, &user)?;

    let update = EventUpdate {
        title: request.title,
        date: request.date.as_deref().map(parse_date).transpose()?,
        capacity: request.capacity.map(positive_capacity).transpose()?,
        duration_hours: request.duration_hours,
        kind: request.kind,
        instructor: request.instructor,
    };

    let updated = state.manager.update_event_or_rollback(&event_id, update)?;
    info!(event_id = %event_id, user = %user.id, "Event updated via API");
    Ok(Json(ApiResponse::new(
        format!("Event {} updated", event_id),
        updated.into(),
    )))
}

/// DELETE /events/:id - Delete an event (creator or admin)
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    let event = require_event(&state, &event_id)?;
    check_event_permission(&event, &user)?;

    if !state.manager.delete_event(&event_id)? {
        return Err(ApiError::not_found("Event not found"));
    }
    info!(event_id = %event_id, user = %user.id, "Event deleted via API");
    Ok(Json(ApiResponse::new(format!("Event {} deleted", event_id), Empty {})))
}
