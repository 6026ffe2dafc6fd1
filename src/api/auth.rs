use axum::{
    extract::State,
    middleware,
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::auth::require_auth;
use crate::api::state::AppState;
use crate::api::AppJson;
use crate::error::{AppError, Result};
use crate::services::auth::AuthenticatedUser;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RecoveryRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ValidateOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub user: UserView,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: bool,
    pub message: String,
    pub data: LoginData,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct OtpValidatedResponse {
    pub status: bool,
    pub message: String,
    pub reset_token: String,
}

fn message(text: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        status: true,
        message: text.to_string(),
    })
}

async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::Validation(
            "Email and password are required".to_string(),
        ));
    }

    let result = state
        .auth
        .login(request.email.trim(), &request.password)
        .await?;

    Ok(Json(LoginResponse {
        status: true,
        message: "Login successful".to_string(),
        data: LoginData {
            user: UserView {
                email: result.profile.email,
                first_name: result.profile.first_name,
                last_name: result.profile.last_name,
                role: result.profile.role,
            },
            token: result.token,
        },
    }))
}

async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<MessageResponse>> {
    state.auth.logout(user.identification).await?;
    Ok(message("Session closed"))
}

async fn password_recovery(
    State(state): State<AppState>,
    AppJson(request): AppJson<RecoveryRequest>,
) -> Result<Json<MessageResponse>> {
    state.auth.password_recovery(request.email.trim()).await?;
    Ok(message("A verification code has been sent to your email"))
}

async fn validate_otp(
    State(state): State<AppState>,
    AppJson(request): AppJson<ValidateOtpRequest>,
) -> Result<Json<OtpValidatedResponse>> {
    let reset_token = state
        .auth
        .validate_otp(request.email.trim(), request.otp.trim())
        .await?;

    Ok(Json(OtpValidatedResponse {
        status: true,
        message: "Code validated".to_string(),
        reset_token,
    }))
}

async fn reset_password(
    State(state): State<AppState>,
    AppJson(request): AppJson<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    if request.new_password.is_empty() {
        return Err(AppError::Validation("New password is required".to_string()));
    }

    state
        .auth
        .reset_password(&request.token, &request.new_password)
        .await?;

    Ok(message("Password updated"))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let authenticated = Router::new()
        .route("/auth/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/recovery", post(password_recovery))
        .route("/auth/validate-otp", post(validate_otp))
        .route("/auth/reset-password", post(reset_password))
        .merge(authenticated)
}
