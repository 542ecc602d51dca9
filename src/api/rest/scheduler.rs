//! Scheduler endpoints

use std::sync::Arc;

use axum::{extract::State, Json};
use chrono::Utc;

use super::events::EventSummary;
use super::{ApiError, ApiResponse};
use crate::api::state::AppState;

/// GET /scheduler/next - Earliest event that has not started yet
///
/// `data` is `null` when nothing is scheduled.
pub async fn next_event(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Option<EventSummary>>>, ApiError> {
    match state.manager.next_event(Utc::now())? {
        Some((start, event)) => {
            let summary = EventSummary {
                date: start,
                ..EventSummary::from(&event)
            };
            Ok(Json(ApiResponse::new("Next event retrieved", Some(summary))))
        }
        None => Ok(Json(ApiResponse::new("No scheduled events", None))),
    }
}
