use crate::services::payment_gateway::{GatewayError, PaymentGateway};
use crate::services::payment_sync::{self, PaymentSyncError};
use crate::store::{AttendeeRepository, StoreError};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconciliationStats {
    pub total_checked: usize,
    pub updated: usize,
    pub not_found: usize,
    pub gateway_errors: usize,
    pub store_errors: usize,
}

/// Background job that refreshes attendees whose payment is still open
///
/// For each attendee in `PENDING` or `STARTED` with a gateway transaction:
/// 1. Query the transaction status from the gateway
/// 2. Store the reported status and the update time
///
/// A failure for one attendee is logged and counted; the sweep moves on to
/// the next one. Only a failure to load the attendees aborts the run.
pub async fn reconcile_pending_payments(
    attendees: &dyn AttendeeRepository,
    gateway: &dyn PaymentGateway,
) -> Result<ReconciliationStats, StoreError> {
    let pending: Vec<(i64, i64)> = attendees
        .list()
        .await?
        .iter()
        .filter_map(|a| a.awaiting_payment().map(|tx| (a.identification, tx)))
        .collect();

    let mut stats = ReconciliationStats {
        total_checked: pending.len(),
        ..Default::default()
    };

    tracing::info!(
        total_pending = stats.total_checked,
        "Starting payment reconciliation job"
    );

    for (identification, transaction_id) in pending {
        match payment_sync::refresh_transaction(attendees, gateway, transaction_id).await {
            Ok(refresh) => {
                tracing::debug!(
                    identification,
                    transaction_id,
                    status = %refresh.status.status_description,
                    "Payment status refreshed"
                );
                stats.updated += 1;
            }
            Err(PaymentSyncError::Gateway(GatewayError::TransactionNotFound(_))) => {
                tracing::warn!(
                    identification,
                    transaction_id,
                    "Transaction unknown to the payment gateway"
                );
                stats.not_found += 1;
            }
            Err(PaymentSyncError::Gateway(e)) => {
                tracing::error!(
                    identification,
                    transaction_id,
                    error = %e,
                    "Gateway error during reconciliation"
                );
                stats.gateway_errors += 1;
            }
            Err(e @ PaymentSyncError::Store { .. }) => {
                tracing::error!(
                    identification,
                    transaction_id,
                    error = %e,
                    "Database error during reconciliation"
                );
                stats.store_errors += 1;
            }
        }
    }

    tracing::info!(?stats, "Payment reconciliation job completed");

    Ok(stats)
}
