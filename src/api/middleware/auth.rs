use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::api::state::AppState;
use crate::error::AppError;
use crate::services::auth::AuthenticatedUser;

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

async fn authenticate(
    state: &AppState,
    token: Option<String>,
) -> Result<AuthenticatedUser, AppError> {
    let token = token.ok_or_else(|| {
        AppError::Unauthorized("Authentication required. Please log in.".to_string())
    })?;

    Ok(state.auth.authenticate(&token).await?)
}

/// Middleware that requires a valid session token.
/// Adds [`AuthenticatedUser`] to the request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers());
    let user = authenticate(&state, token).await?;
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Like [`require_auth`], restricted to admins and superadmins
pub async fn require_staff(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers());
    let user = authenticate(&state, token).await?;
    if !user.role.is_staff() {
        tracing::warn!(
            identification = user.identification,
            role = user.role.as_str(),
            "Staff route refused"
        );
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
