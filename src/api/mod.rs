// API module - HTTP endpoints

pub mod attendees;
pub mod auth;
pub mod health;
pub mod middleware;
pub mod payments;
pub mod state;
pub mod users;

use axum::{extract::FromRequest, Router};

use crate::error::AppError;
use state::AppState;

/// JSON body extractor whose rejections use the crate's error body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Every route of the service, ready to be layered and served
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(attendees::router(&state))
        .merge(payments::router(&state))
        .merge(auth::router(&state))
        .merge(users::router(&state))
        .with_state(state)
}
