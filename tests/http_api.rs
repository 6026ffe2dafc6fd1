mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use common::{FaultyStore, StubGateway};
use event_registration::api::{self, state::AppState};
use event_registration::models::profile::{CreateProfileData, Role};
use event_registration::services::password::hash_password;
use event_registration::services::tokens::TokenIssuer;
use event_registration::store::{InMemoryStore, ProfileRepository};

fn app(store: &InMemoryStore) -> Router {
    let state = AppState::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(StubGateway::new().with_status(9, "APROBADA")),
        TokenIssuer::new(Secret::new("test-secret".to_string())),
        true,
    );
    api::router(state)
}

async fn seed_user(store: &InMemoryStore, identification: i64, email: &str, role: Role) {
    ProfileRepository::insert(
        store,
        CreateProfileData {
            identification,
            first_name: "Staff".to_string(),
            last_name: "Member".to_string(),
            phone: format!("60{identification}"),
            email: email.to_string(),
            role,
            password_hash: hash_password("s3cret").unwrap(),
            is_active: true,
        },
    )
    .await
    .unwrap();
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn registration_body(identification: i64, phone: &str, email: &str) -> Value {
    json!({
        "assistant": {
            "identification": identification,
            "first_name": "Ana",
            "last_name": "Rojas",
            "phone": phone,
            "email": email,
            "city": "Cali",
            "distributor": "Norte",
            "distributor_id": 7,
            "main_procedure": "Implants",
            "product_brand": "Acme",
            "weekly_procedure": "5",
            "contact": true
        }
    })
}

async fn login(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/auth/login",
            json!({"email": email, "password": "s3cret"}),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_datastore_and_gateway() {
    let store = InMemoryStore::new();
    let (status, body) = send(&app(&store), empty_request("GET", "/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["dependencies"]["payment_gateway"]["status"], "configured");
}

#[tokio::test]
async fn health_hides_datastore_errors() {
    let store = FaultyStore::new();
    store.fail_count();
    let state = AppState::new(
        Arc::new(store.clone()),
        Arc::new(store),
        Arc::new(StubGateway::new()),
        TokenIssuer::new(Secret::new("test-secret".to_string())),
        false,
    );

    let (status, body) = send(&api::router(state), empty_request("GET", "/health", None)).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["dependencies"]["database"]["error"], "Database unavailable");
    assert!(!body.to_string().contains("disabled for test"));
    assert_eq!(body["dependencies"]["payment_gateway"]["status"], "not_configured");
}

#[tokio::test]
async fn registration_returns_checkout_url() {
    let store = InMemoryStore::new();
    let app = app(&store);

    let (status, body) = send(
        &app,
        json_request("POST", "/assistants", registration_body(123, "555", "a@x.com"), None),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], true);
    assert_eq!(body["transaction_id"], 9);
    assert_eq!(body["url_redirect"], "https://pay/9");
    assert_eq!(body["data"][0]["identification"], 123);
    assert!(body["data"][0].get("payment_ref").is_none());
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let store = InMemoryStore::new();
    let app = app(&store);

    send(
        &app,
        json_request("POST", "/assistants", registration_body(123, "555", "a@x.com"), None),
    )
    .await;
    let (status, body) = send(
        &app,
        json_request("POST", "/assistants", registration_body(124, "556", "a@x.com"), None),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], false);
    assert_eq!(body["error"], "CONFLICT");
    assert_eq!(body["message"], "The email address is already registered");
}

#[tokio::test]
async fn registration_lists_missing_fields() {
    let store = InMemoryStore::new();
    let (status, body) = send(
        &app(&store),
        json_request(
            "POST",
            "/assistants",
            json!({"assistant": {"identification": 1, "first_name": "Ana"}}),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("assistant.email"));
    assert!(!message.contains("assistant.first_name"));
}

#[tokio::test]
async fn staff_routes_require_a_staff_token() {
    let store = InMemoryStore::new();
    seed_user(&store, 1, "attendee@x.com", Role::Assistant).await;
    let app = app(&store);

    let (status, _) = send(&app, empty_request("GET", "/assistants", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = login(&app, "attendee@x.com").await;
    let (status, body) = send(&app, empty_request("GET", "/assistants", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "FORBIDDEN");
}

#[tokio::test]
async fn entry_is_registered_once() {
    let store = InMemoryStore::new();
    seed_user(&store, 1, "admin@x.com", Role::Admin).await;
    let app = app(&store);

    send(
        &app,
        json_request("POST", "/assistants", registration_body(123, "555", "a@x.com"), None),
    )
    .await;
    let token = login(&app, "admin@x.com").await;

    let (status, body) = send(
        &app,
        empty_request("PATCH", "/assistants/register-entry/123", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["entry"], true);
    let first_time = body["data"]["entry_datetime"].clone();

    let (status, _) = send(
        &app,
        empty_request("PATCH", "/assistants/register-entry/123", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, empty_request("GET", "/assistants/123", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["entry_datetime"], first_time);

    let (status, _) = send(
        &app,
        empty_request("PATCH", "/assistants/register-entry/999", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn transaction_lookup_updates_the_attendee() {
    let store = InMemoryStore::new();
    seed_user(&store, 1, "admin@x.com", Role::Admin).await;
    let app = app(&store);

    send(
        &app,
        json_request("POST", "/assistants", registration_body(123, "555", "a@x.com"), None),
    )
    .await;
    let token = login(&app, "admin@x.com").await;

    let (status, body) = send(
        &app,
        empty_request("GET", "/payments/transaction/9", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["estado_Descripcion"], "APROBADA");
    assert_eq!(body["updated"], 1);

    let (_, body) = send(&app, empty_request("GET", "/assistants/123", Some(&token))).await;
    assert_eq!(body["data"]["payment_status"], "APROBADA");

    let (status, _) = send(
        &app,
        empty_request("GET", "/payments/transaction/404", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn logout_revokes_the_session_token() {
    let store = InMemoryStore::new();
    seed_user(&store, 1, "admin@x.com", Role::Admin).await;
    let app = app(&store);
    let token = login(&app, "admin@x.com").await;

    let (status, _) = send(&app, empty_request("POST", "/auth/logout", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, empty_request("GET", "/users", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn superadmin_role_cannot_be_assigned_over_http() {
    let store = InMemoryStore::new();
    seed_user(&store, 1, "admin@x.com", Role::Admin).await;
    let app = app(&store);
    let token = login(&app, "admin@x.com").await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/users",
            json!({
                "identification": 2,
                "first_name": "Luis",
                "last_name": "Mora",
                "phone": "777",
                "email": "luis@x.com"
            }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "admin");
    assert!(body["data"].get("password").is_none());

    let (status, _) = send(
        &app,
        json_request(
            "PATCH",
            "/users/2/role",
            json!({"role": "superadmin"}),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &app,
        empty_request("PATCH", "/users/2/status", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_active"], false);
}
