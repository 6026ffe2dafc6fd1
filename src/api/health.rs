use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::api::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub dependencies: DependencyStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyStatus {
    pub database: ServiceHealth,
    pub payment_gateway: ServiceHealth,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    pub response_time_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Returns 200 when the datastore answers, 503 otherwise.
/// The gateway is only reported as configured or not; it is never called.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let start = Instant::now();

    let database = check_database(&state).await;
    let payment_gateway = ServiceHealth {
        status: if state.gateway_configured {
            "configured".to_string()
        } else {
            "not_configured".to_string()
        },
        response_time_ms: 0,
        error: None,
    };

    let healthy = database.status == "healthy";
    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dependencies: DependencyStatus {
            database,
            payment_gateway,
        },
    };

    tracing::info!(
        status = %response.status,
        duration_ms = start.elapsed().as_millis(),
        "Health check completed"
    );

    (status_code, Json(response))
}

async fn check_database(state: &AppState) -> ServiceHealth {
    let start = Instant::now();

    match state.attendees.count().await {
        Ok(_) => ServiceHealth {
            status: "healthy".to_string(),
            response_time_ms: start.elapsed().as_millis(),
            error: None,
        },
        Err(e) => {
            tracing::error!(error = %e, "Health check could not reach the datastore");
            ServiceHealth {
                status: "unhealthy".to_string(),
                response_time_ms: start.elapsed().as_millis(),
                error: Some("Database unavailable".to_string()),
            }
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
