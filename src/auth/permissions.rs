//! Role checks for event routes

use crate::types::{Event, Role, User};

use super::AuthError;

/// Only organizers may create events
pub fn require_organizer(user: &User) -> Result<(), AuthError> {
    if user.role == Role::Organizer {
        Ok(())
    } else {
        Err(AuthError::Forbidden("Only organizers can create events".to_string()))
    }
}

/// Admins may touch any event, everyone else only their own
pub fn check_event_permission(event: &Event, user: &User) -> Result<(), AuthError> {
    if user.is_admin() || event.created_by == user.id {
        Ok(())
    } else {
        Err(AuthError::Forbidden(
            "Access denied: you are not the event organizer".to_string(),
        ))
    }
}
