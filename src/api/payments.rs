use axum::{
    extract::{Path, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::api::middleware::auth::require_staff;
use crate::api::state::AppState;
use crate::api::AppJson;
use crate::error::Result;
use crate::services::payment_gateway::{TransactionRequest, TransactionResult, TransactionStatus};
use crate::services::payment_sync;

#[derive(Debug, Serialize)]
pub struct TransactionCreatedResponse {
    pub status: bool,
    pub data: TransactionResult,
}

#[derive(Debug, Serialize)]
pub struct TransactionStatusResponse {
    pub status: bool,
    pub data: TransactionStatus,
    /// Local attendees whose payment status was refreshed
    pub updated: u64,
}

/// Opens a charge without touching any local row
async fn create_transaction(
    State(state): State<AppState>,
    AppJson(request): AppJson<TransactionRequest>,
) -> Result<Json<TransactionCreatedResponse>> {
    let result = state.gateway.create_transaction(&request).await?;

    tracing::info!(
        transaction_id = result.transaction_id,
        reference = %request.reference,
        "Transaction created"
    );

    Ok(Json(TransactionCreatedResponse {
        status: true,
        data: result,
    }))
}

async fn find_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<i64>,
) -> Result<Json<TransactionStatusResponse>> {
    let refresh = payment_sync::refresh_transaction(
        state.attendees.as_ref(),
        state.gateway.as_ref(),
        transaction_id,
    )
    .await?;

    Ok(Json(TransactionStatusResponse {
        status: true,
        data: refresh.status,
        updated: refresh.updated,
    }))
}

pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/payments", post(create_transaction))
        .route("/payments/transaction/:id", get(find_transaction))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_staff))
}
