use chrono::Utc;

use crate::services::payment_gateway::{GatewayError, PaymentGateway, TransactionStatus};
use crate::store::{AttendeeRepository, StoreError};

#[derive(thiserror::Error, Debug)]
pub enum PaymentSyncError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The gateway answered but the local update failed
    #[error("Could not store payment status for transaction {transaction_id}: {source}")]
    Store {
        transaction_id: i64,
        status: TransactionStatus,
        #[source]
        source: StoreError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRefresh {
    pub status: TransactionStatus,
    /// Attendees linked to the transaction
    pub updated: u64,
}

/// Asks the gateway for the state of `transaction_id` and stores it on the
/// attendee that owns the transaction.
#[tracing::instrument(skip(attendees, gateway))]
pub async fn refresh_transaction(
    attendees: &dyn AttendeeRepository,
    gateway: &dyn PaymentGateway,
    transaction_id: i64,
) -> Result<PaymentRefresh, PaymentSyncError> {
    let status = gateway.query_transaction(transaction_id).await?;

    let updated = match attendees
        .update_payment_status(transaction_id, &status.status_description, Utc::now())
        .await
    {
        Ok(updated) => updated,
        Err(source) => {
            return Err(PaymentSyncError::Store {
                transaction_id,
                status,
                source,
            })
        }
    };

    if updated == 0 {
        tracing::warn!("No attendee linked to transaction");
    } else {
        tracing::debug!(
            status = %status.status_description,
            updated,
            "Payment status stored"
        );
    }

    Ok(PaymentRefresh { status, updated })
}
