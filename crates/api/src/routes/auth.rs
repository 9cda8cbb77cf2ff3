//! Mock sign-in endpoints.

use std::sync::Arc;

use adapters::http::ApiResponse;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{AuthError, AuthUser, IssuedToken};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub user: AuthUser,
    #[serde(flatten)]
    pub token: IssuedToken,
}

/// Extracts the token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)
}

/// POST /api/auth/login
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let (user, token) = state.auth.login(&body.email, &body.password)?;
    Ok(Json(
        ApiResponse::ok(LoginResponse { user, token }).with_message("Authentication successful"),
    ))
}

/// GET /api/auth/me: profile of the signed-in account.
#[tracing::instrument(skip_all)]
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<AuthUser>>, ApiError> {
    let user = state.auth.authenticate(bearer_token(&headers)?)?;
    Ok(Json(ApiResponse::ok(user)))
}

/// POST /api/auth/logout
#[tracing::instrument(skip_all)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    state.auth.logout(bearer_token(&headers)?)?;
    Ok(Json(
        ApiResponse::ok(Value::Null).with_message("Signed out successfully"),
    ))
}

/// POST /api/auth/refresh: swaps a valid token for a new one.
#[tracing::instrument(skip_all)]
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<IssuedToken>>, ApiError> {
    let token = state.auth.refresh(bearer_token(&headers)?)?;
    Ok(Json(
        ApiResponse::ok(token).with_message("Token refreshed successfully"),
    ))
}
