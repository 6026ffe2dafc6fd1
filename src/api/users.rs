use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::auth::require_staff;
use crate::api::state::AppState;
use crate::api::AppJson;
use crate::error::{AppError, Result};
use crate::models::profile::{LoginProfile, Role};
use crate::services::users::NewUser;

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub status: bool,
    pub message: String,
    pub data: LoginProfile,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub status: bool,
    pub count: usize,
    pub data: Vec<LoginProfile>,
}

fn user_response(message: &str, profile: LoginProfile) -> Json<UserResponse> {
    Json(UserResponse {
        status: true,
        message: message.to_string(),
        data: profile,
    })
}

async fn create_user(
    State(state): State<AppState>,
    AppJson(user): AppJson<NewUser>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let blank: Vec<&str> = [
        ("first_name", &user.first_name),
        ("last_name", &user.last_name),
        ("phone", &user.phone),
        ("email", &user.email),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name)
    .collect();

    if !blank.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing fields: {}",
            blank.join(", ")
        )));
    }

    let profile = state.users.create(user).await?;

    Ok((
        StatusCode::CREATED,
        user_response("User created successfully", profile),
    ))
}

async fn list_users(State(state): State<AppState>) -> Result<Json<UserListResponse>> {
    let users = state.users.list().await?;

    Ok(Json(UserListResponse {
        status: true,
        count: users.len(),
        data: users,
    }))
}

async fn show_user(
    State(state): State<AppState>,
    Path(identification): Path<i64>,
) -> Result<Json<UserResponse>> {
    let profile = state.users.find(identification).await?;
    Ok(user_response("User found", profile))
}

async fn update_role(
    State(state): State<AppState>,
    Path(identification): Path<i64>,
    AppJson(request): AppJson<UpdateRoleRequest>,
) -> Result<Json<UserResponse>> {
    let profile = state.users.update_role(identification, request.role).await?;
    Ok(user_response("Role updated", profile))
}

async fn toggle_status(
    State(state): State<AppState>,
    Path(identification): Path<i64>,
) -> Result<Json<UserResponse>> {
    let profile = state.users.toggle_status(identification).await?;
    Ok(user_response("Status updated", profile))
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:identification", get(show_user))
        .route("/users/:identification/role", patch(update_role))
        .route("/users/:identification/status", patch(toggle_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_staff))
}
