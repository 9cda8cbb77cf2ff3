//! User management endpoints.

use std::sync::Arc;

use adapters::http::{ApiResponse, PaginatedApiResponse};
use application::commands::{
    ActivateUserCommand, CreateUserCommand, DeleteUserCommand, GetUserByIdQuery, GetUsersQuery,
    SuspendUserCommand, UpdateUserCommand,
};
use application::dto::UserDto;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use serde::Deserialize;

use super::auth::bearer_token;
use super::{page_request, paginated};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivateUserRequest {
    pub activated_by: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SuspendUserRequest {
    pub reason: Option<String>,
}

/// GET /api/users: one page of users, optionally narrowed to one email.
#[tracing::instrument(skip(state))]
pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListUsersParams>,
) -> Result<Json<PaginatedApiResponse<UserDto>>, ApiError> {
    let result = state
        .get_users
        .execute(GetUsersQuery {
            page: page_request(params.limit, params.offset),
            email: params.email.filter(|e| !e.trim().is_empty()),
        })
        .await?;

    Ok(Json(paginated(
        result.users,
        result.total,
        result.limit,
        result.offset,
        result.has_more,
    )))
}

/// POST /api/users: registers a user in pending status.
#[tracing::instrument(skip(state, command))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(command): Json<CreateUserCommand>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let user = state.create_user.execute(command).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(user).with_message("User created successfully")),
    ))
}

/// GET /api/users/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state.get_user.execute(GetUserByIdQuery { user_id }).await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// PUT /api/users/{id}: changes name and/or email.
#[tracing::instrument(skip(state, body))]
pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .update_user
        .execute(UpdateUserCommand {
            user_id,
            name: body.name,
            email: body.email,
        })
        .await?;
    Ok(Json(
        ApiResponse::ok(user).with_message("User updated successfully"),
    ))
}

/// DELETE /api/users/{id}
#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .delete_user
        .execute(DeleteUserCommand { user_id })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/users/{id}/activate
///
/// The activator is taken from the body, then from the signed-in account,
/// and defaults to `system`.
#[tracing::instrument(skip(state, headers, body))]
pub async fn activate(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<ActivateUserRequest>>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let activated_by = body
        .activated_by
        .or_else(|| {
            bearer_token(&headers)
                .and_then(|token| state.auth.authenticate(token))
                .ok()
                .map(|user| user.email)
        })
        .unwrap_or_else(|| "system".to_string());

    let user = state
        .activate_user
        .execute(ActivateUserCommand {
            user_id,
            activated_by,
            reason: body.reason,
        })
        .await?;
    Ok(Json(
        ApiResponse::ok(user).with_message("User activated successfully"),
    ))
}

/// POST /api/users/{id}/suspend
#[tracing::instrument(skip(state, body))]
pub async fn suspend(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    body: Option<Json<SuspendUserRequest>>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let body = body.map(|Json(body)| body).unwrap_or_default();
    let user = state
        .suspend_user
        .execute(SuspendUserCommand {
            user_id,
            reason: body.reason,
        })
        .await?;
    Ok(Json(
        ApiResponse::ok(user).with_message("User suspended successfully"),
    ))
}
