use std::sync::Arc;

use crate::models::attendee::{AttendeeSummary, CreateAttendeeData, NewAttendee, PaymentStatus};
use crate::models::profile::{CreateProfileData, Role};
use crate::services::password::{self, PasswordError};
use crate::services::payment_gateway::{
    GatewayError, Payer, PaymentGateway, TransactionRequest, TransactionResult,
};
use crate::services::reference::ReferenceGenerator;
use crate::store::{AttendeeRepository, DuplicateField, ProfileRepository, StoreError};

/// Congress fee, in pesos
pub const CHARGE_AMOUNT: i64 = 500_000;
pub const CHARGE_DESCRIPTION: &str = "Pago Congreso Magno 3.0";

const DOCUMENT_TYPE_ID: i32 = 1;
const PAYMENT_SOURCE: i32 = 1;
const IMPLEMENTATION_TYPE: i32 = 1;

#[derive(thiserror::Error, Debug)]
pub enum ProfileWriteError {
    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(thiserror::Error, Debug)]
pub enum RegistrationError {
    #[error("Could not open the payment transaction: {0}")]
    PaymentInitiationFailed(#[source] GatewayError),

    #[error("{}", .0.message())]
    DuplicateField(DuplicateField),

    #[error("Could not store the attendee: {0}")]
    PersistenceFailed(#[source] StoreError),

    #[error("Could not create the login profile: {0}")]
    ProfileCreationFailed(#[source] ProfileWriteError),

    /// The attendee row is left behind without a profile and needs manual cleanup
    #[error(
        "Rollback of attendee {identification} failed after profile error ({original}): {compensation}"
    )]
    CompensationFailed {
        identification: i64,
        original: ProfileWriteError,
        compensation: StoreError,
    },
}

/// A registered attendee with an open charge
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub attendee: AttendeeSummary,
    pub url_redirect: String,
    pub transaction_id: i64,
    pub payment_ref: String,
}

/// Registers an attendee and their login profile around a gateway charge.
///
/// The two rows live in separate tables with no shared transaction. If the
/// profile insert fails, the attendee row is deleted again, so a caller sees
/// either both rows or neither. The one exception is
/// [`RegistrationError::CompensationFailed`].
#[derive(Clone)]
pub struct RegistrationSaga {
    attendees: Arc<dyn AttendeeRepository>,
    profiles: Arc<dyn ProfileRepository>,
    gateway: Arc<dyn PaymentGateway>,
    references: ReferenceGenerator,
}

impl RegistrationSaga {
    pub fn new(
        attendees: Arc<dyn AttendeeRepository>,
        profiles: Arc<dyn ProfileRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        let references = ReferenceGenerator::new(attendees.clone());
        Self {
            attendees,
            profiles,
            gateway,
            references,
        }
    }

    #[tracing::instrument(skip(self, input), fields(identification = input.identification))]
    pub async fn register(&self, input: NewAttendee) -> Result<Registration, RegistrationError> {
        // 1. Quote
        let invoice_number = self.references.next_invoice_number().await;
        let reference = self
            .references
            .generate_reference(input.identification)
            .await;

        tracing::debug!(invoice_number, reference = %reference, "Quoted registration");

        // 2. Open the charge before anything is written
        let request = transaction_request(&input, invoice_number, &reference);
        let transaction = self
            .gateway
            .create_transaction(&request)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Payment transaction could not be opened");
                RegistrationError::PaymentInitiationFailed(e)
            })?;

        // 3. Attendee row
        let identification = input.identification;
        let attendee = self
            .attendees
            .insert(CreateAttendeeData {
                attendee: input,
                payment_status: PaymentStatus::Pending,
                payment_ref: reference.clone(),
                transaction_id: transaction.transaction_id,
            })
            .await
            .map_err(classify_attendee_error)?;

        tracing::debug!(
            transaction_id = transaction.transaction_id,
            "Attendee stored"
        );

        // 4. Login profile, compensated by removing the attendee row
        if let Err(original) = self.create_profile(&attendee.public_view()).await {
            return Err(self.compensate(identification, original).await);
        }

        let TransactionResult {
            transaction_id,
            url,
        } = transaction;

        tracing::info!(
            transaction_id,
            reference = %reference,
            "Attendee registered"
        );

        Ok(Registration {
            attendee: attendee.public_view(),
            url_redirect: url,
            transaction_id,
            payment_ref: reference,
        })
    }

    /// The initial password is the identification number itself.
    async fn create_profile(&self, attendee: &AttendeeSummary) -> Result<(), ProfileWriteError> {
        let password_hash = password::hash_password(&attendee.identification.to_string())?;

        self.profiles
            .insert(CreateProfileData {
                identification: attendee.identification,
                first_name: attendee.first_name.clone(),
                last_name: attendee.last_name.clone(),
                phone: attendee.phone.clone(),
                email: attendee.email.clone(),
                role: Role::Assistant,
                password_hash,
                is_active: true,
            })
            .await?;

        Ok(())
    }

    async fn compensate(&self, identification: i64, original: ProfileWriteError) -> RegistrationError {
        tracing::warn!(
            error = %original,
            "Login profile creation failed, removing attendee"
        );

        match self.attendees.delete(identification).await {
            Ok(_) => RegistrationError::ProfileCreationFailed(original),
            Err(compensation) => {
                tracing::error!(
                    original_error = %original,
                    compensation_error = %compensation,
                    "Attendee rollback failed; attendee exists without a login profile"
                );
                RegistrationError::CompensationFailed {
                    identification,
                    original,
                    compensation,
                }
            }
        }
    }
}

fn classify_attendee_error(err: StoreError) -> RegistrationError {
    match err.duplicate_field() {
        Some(field) => {
            tracing::info!(field = field.as_str(), "Attendee already registered");
            RegistrationError::DuplicateField(field)
        }
        None => {
            tracing::error!(error = %err, "Attendee insert failed");
            RegistrationError::PersistenceFailed(err)
        }
    }
}

pub fn transaction_request(
    attendee: &NewAttendee,
    invoice_number: i64,
    reference: &str,
) -> TransactionRequest {
    TransactionRequest {
        procedure_id: attendee.distributor_id,
        payer: Payer {
            document: attendee.identification.to_string(),
            document_type: DOCUMENT_TYPE_ID,
            full_name: None,
            verification_digit: None,
            first_name: attendee.first_name.clone(),
            middle_name: String::new(),
            last_name: attendee.last_name.clone(),
            second_last_name: String::new(),
            phone: attendee.phone.clone(),
            email: attendee.email.clone(),
            address: attendee.city.clone(),
        },
        payment_source: PAYMENT_SOURCE,
        implementation_type: IMPLEMENTATION_TYPE,
        return_url_enabled: false,
        return_url: None,
        amount: CHARGE_AMOUNT,
        invoice_number,
        reference: reference.to_string(),
        description: CHARGE_DESCRIPTION.to_string(),
    }
}
