//! Request extractors

use std::sync::Arc;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::auth::AuthError;
use crate::types::User;

use super::rest::ApiError;
use super::state::AppState;

/// Authenticated caller, resolved from a bearer access token
///
/// The user row is re-read on every request so role changes and deleted
/// accounts take effect before the token expires.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = bearer_header(&parts.headers)?;
        let claims = state.auth.validate_authorization(header)?;
        if !claims.is_access() {
            return Err(AuthError::InvalidTokenType.into());
        }

        let user = state
            .db
            .get_user_by_email(&claims.sub)
            .ok_or(AuthError::UserNotFound)?;
        Ok(CurrentUser(user))
    }
}

/// Raw `Authorization` header value
pub(crate) fn bearer_header(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingToken)
}
