//! Account and token endpoints

use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use super::{ApiError, ApiResponse};
use crate::api::extract::bearer_header;
use crate::api::state::AppState;
use crate::auth::{NewUser, TokenPair};

#[derive(Debug, Serialize)]
pub struct Registered {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /register - Create a user account
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(new_user): Json<NewUser>,
) -> Result<(StatusCode, Json<ApiResponse<Registered>>), ApiError> {
    let user = state.auth.register_user(&state.db, new_user)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("User registered", Registered { email: user.email })),
    ))
}

/// POST /login - Exchange credentials for a token pair
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let (_, tokens) = state.auth.login(&state.db, &request.email, &request.password)?;
    Ok(Json(ApiResponse::new("Login successful", tokens)))
}

/// POST /refresh - Refresh token in the `Authorization` header
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<TokenPair>>, ApiError> {
    let header = bearer_header(&headers)?;
    let token = header.strip_prefix("Bearer ").unwrap_or(header);
    let tokens = state.auth.refresh_access_token(token.trim())?;
    Ok(Json(ApiResponse::new("Token refreshed", tokens)))
}
