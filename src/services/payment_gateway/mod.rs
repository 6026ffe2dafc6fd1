//! Client side of the external payment gateway.
//!
//! [`GatewaySession`] owns the bearer credential shared by the whole process;
//! [`PaymentGatewayClient`] issues transaction calls through it and retries
//! exactly once after re-authenticating when the gateway answers 401.

pub mod client;
pub mod session;
pub mod types;

pub use client::{PaymentGateway, PaymentGatewayClient};
pub use session::{GatewaySession, GatewaySettings};
pub use types::{Payer, TransactionRequest, TransactionResult, TransactionStatus};

#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    /// Missing or malformed gateway settings. Never retried.
    #[error("Payment gateway not configured: {0}")]
    Configuration(String),

    /// The login endpoint refused the configured credentials or returned no token
    #[error("Payment gateway authentication failed: {0}")]
    Authentication(String),

    /// The credential was rejected again right after a fresh login
    #[error("Payment gateway rejected a freshly issued credential")]
    CredentialRejected,

    #[error("Transaction {0} not found")]
    TransactionNotFound(i64),

    #[error("Payment gateway error: {status} - {message}")]
    Upstream { status: u16, message: String },

    #[error("Payment gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected payment gateway response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Builds an [`GatewayError::Upstream`] from a non-success response
    pub(crate) async fn upstream(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        GatewayError::Upstream { status, message }
    }
}
