use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;

use crate::api::middleware::auth::require_staff;
use crate::api::state::AppState;
use crate::api::AppJson;
use crate::error::{AppError, Result};
use crate::models::attendee::{Attendee, AttendeeSummary, NewAttendee};

const REQUIRED_FIELDS: [&str; 11] = [
    "identification",
    "first_name",
    "last_name",
    "phone",
    "email",
    "city",
    "distributor",
    "main_procedure",
    "product_brand",
    "weekly_procedure",
    "contact",
];

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub status: bool,
    pub message: String,
    pub data: Vec<AttendeeSummary>,
    pub url_redirect: String,
    pub transaction_id: i64,
}

#[derive(Debug, Serialize)]
pub struct AttendeeListResponse {
    pub status: bool,
    pub message: String,
    pub count: usize,
    pub data: Vec<Attendee>,
}

#[derive(Debug, Serialize)]
pub struct AttendeeResponse {
    pub status: bool,
    pub message: String,
    pub data: Attendee,
}

/// Pulls the `assistant` object out of a registration body, naming every
/// missing or mistyped field at once.
fn parse_registration(body: Value) -> Result<NewAttendee> {
    let assistant = match body.get("assistant") {
        Some(Value::Object(fields)) => fields,
        _ => return Err(AppError::Validation("Missing fields: assistant".to_string())),
    };

    let mut problems: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| assistant.get(**field).map_or(true, Value::is_null))
        .map(|field| format!("assistant.{}", field))
        .collect();

    if let Some(id) = assistant.get("identification") {
        if !id.is_null() && !id.is_i64() {
            problems.push("identification must be a number".to_string());
        }
    }
    if let Some(contact) = assistant.get("contact") {
        if !contact.is_null() && !contact.is_boolean() {
            problems.push("contact must be a boolean".to_string());
        }
    }

    if !problems.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing fields: {}",
            problems.join(", ")
        )));
    }

    serde_json::from_value(Value::Object(assistant.clone()))
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// Public registration entry point
async fn register_attendee(
    State(state): State<AppState>,
    AppJson(body): AppJson<Value>,
) -> Result<(StatusCode, Json<RegistrationResponse>)> {
    let attendee = parse_registration(body)?;
    let registration = state.registration.register(attendee).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            status: true,
            message: "Attendee registered successfully".to_string(),
            data: vec![registration.attendee],
            url_redirect: registration.url_redirect,
            transaction_id: registration.transaction_id,
        }),
    ))
}

async fn list_attendees(State(state): State<AppState>) -> Result<Json<AttendeeListResponse>> {
    let attendees = state.attendee_service.list().await?;

    Ok(Json(AttendeeListResponse {
        status: true,
        message: "Attendees found".to_string(),
        count: attendees.len(),
        data: attendees,
    }))
}

async fn show_attendee(
    State(state): State<AppState>,
    Path(identification): Path<i64>,
) -> Result<Json<AttendeeResponse>> {
    let attendee = state.attendee_service.find(identification).await?;

    Ok(Json(AttendeeResponse {
        status: true,
        message: "Attendee found".to_string(),
        data: attendee,
    }))
}

async fn register_entry(
    State(state): State<AppState>,
    Path(identification): Path<i64>,
) -> Result<Json<AttendeeResponse>> {
    let attendee = state.attendee_service.register_entry(identification).await?;

    Ok(Json(AttendeeResponse {
        status: true,
        message: "Entry registered successfully".to_string(),
        data: attendee,
    }))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let staff = Router::new()
        .route("/assistants", get(list_attendees))
        .route("/assistants/:identification", get(show_attendee))
        .route(
            "/assistants/register-entry/:identification",
            patch(register_entry),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_staff));

    Router::new()
        .route("/assistants", post(register_attendee))
        .merge(staff)
}
