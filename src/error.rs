use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::attendees::AttendeeError;
use crate::services::auth::AuthServiceError;
use crate::services::payment_gateway::GatewayError;
use crate::services::payment_sync::PaymentSyncError;
use crate::services::registration::RegistrationError;
use crate::services::users::UserError;
use crate::store::StoreError;

/// HTTP-facing error. Variants carry the message shown to the client; the
/// underlying cause is logged where the error is converted.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Payment gateway error")]
    PaymentGateway,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Conflict(_) => "CONFLICT",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden => "FORBIDDEN",
            AppError::PaymentGateway => "PAYMENT_GATEWAY_ERROR",
            AppError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();

        let (status, message) = match self {
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "Insufficient permissions".to_string(),
            ),
            AppError::PaymentGateway => (
                StatusCode::BAD_GATEWAY,
                "The payment service is unavailable, please try again later".to_string(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "status": false,
            "error": code,
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        tracing::error!(error = %err, "Store error");
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::TransactionNotFound(id) => {
                AppError::NotFound(format!("Transaction {} not found", id))
            }
            GatewayError::Configuration(_) => {
                tracing::error!(error = %err, "Payment gateway misconfigured");
                AppError::Internal(anyhow::Error::new(err))
            }
            other => {
                tracing::error!(error = %other, "Payment gateway call failed");
                AppError::PaymentGateway
            }
        }
    }
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::DuplicateField(field) => {
                AppError::Conflict(field.message().to_string())
            }
            RegistrationError::PaymentInitiationFailed(e) => e.into(),
            RegistrationError::CompensationFailed { .. } => {
                tracing::error!(
                    error = %err,
                    "Registration left an attendee without login profile; manual cleanup required"
                );
                AppError::Internal(anyhow::Error::new(err))
            }
            other => {
                tracing::error!(error = %other, "Registration failed");
                AppError::Internal(anyhow::Error::new(other))
            }
        }
    }
}

impl From<PaymentSyncError> for AppError {
    fn from(err: PaymentSyncError) -> Self {
        match err {
            PaymentSyncError::Gateway(e) => e.into(),
            PaymentSyncError::Store { source, .. } => source.into(),
        }
    }
}

impl From<AttendeeError> for AppError {
    fn from(err: AttendeeError) -> Self {
        match err {
            AttendeeError::NotFound(_) => AppError::NotFound(err.to_string()),
            AttendeeError::EntryAlreadyRegistered(_) => AppError::Conflict(err.to_string()),
            AttendeeError::Store(e) => e.into(),
        }
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) => AppError::NotFound(err.to_string()),
            UserError::DuplicateField(field) => AppError::Conflict(field.message().to_string()),
            UserError::SuperadminImmutable | UserError::SuperadminNotAssignable => {
                AppError::Conflict(err.to_string())
            }
            UserError::Password(e) => AppError::Internal(anyhow::Error::new(e)),
            UserError::Store(e) => e.into(),
        }
    }
}

impl From<AuthServiceError> for AppError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::InvalidCredentials
            | AuthServiceError::WrongTokenPurpose
            | AuthServiceError::Token(_) => AppError::Unauthorized(err.to_string()),
            AuthServiceError::EmailNotFound
            | AuthServiceError::OtpExpired
            | AuthServiceError::OtpInvalid => AppError::Validation(err.to_string()),
            AuthServiceError::Store(e) => e.into(),
            other => {
                tracing::error!(error = %other, "Authentication failure");
                AppError::Internal(anyhow::Error::new(other))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
