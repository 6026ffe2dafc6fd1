//! Record store ports.
//!
//! The registration flow writes two independent tables with no shared
//! transaction, so every write goes through these traits. [`PgStore`] is the
//! production adapter; [`InMemoryStore`] backs tests and local runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgDatabaseError;

use crate::models::attendee::{Attendee, CreateAttendeeData};
use crate::models::profile::{CreateProfileData, LoginProfile, Role};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("unique constraint {constraint} violated: {detail}")]
    UniqueViolation { constraint: String, detail: String },

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let detail = db_err
                    .try_downcast_ref::<PgDatabaseError>()
                    .and_then(|pg| pg.detail())
                    .unwrap_or_else(|| db_err.message())
                    .to_string();

                return StoreError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or_default().to_string(),
                    detail,
                };
            }
        }

        StoreError::Database(err)
    }
}

/// Unique column of the attendee/profile tables that a write collided with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Phone,
    Email,
    Identification,
}

impl DuplicateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplicateField::Phone => "phone",
            DuplicateField::Email => "email",
            DuplicateField::Identification => "identification",
        }
    }

    /// User-facing conflict message
    pub fn message(&self) -> &'static str {
        match self {
            DuplicateField::Phone => "The phone number is already registered",
            DuplicateField::Email => "The email address is already registered",
            DuplicateField::Identification => "The identification number is already registered",
        }
    }
}

impl DuplicateField {
    fn from_column(column: &str) -> Option<Self> {
        match column {
            "phone" => Some(DuplicateField::Phone),
            "email" => Some(DuplicateField::Email),
            "identification" => Some(DuplicateField::Identification),
            _ => None,
        }
    }

    /// `assistant_phone_key`, `users_profile_email_key`, `assistant_pkey`
    fn from_constraint(constraint: &str) -> Option<Self> {
        if constraint.ends_with("_pkey") {
            return Some(DuplicateField::Identification);
        }
        constraint
            .strip_suffix("_key")
            .and_then(|rest| rest.rsplit('_').next())
            .and_then(Self::from_column)
    }
}

/// Column list of a `Key (column)=(value) already exists.` detail
fn detail_column(detail: &str) -> Option<&str> {
    let (columns, _) = detail.strip_prefix("Key (")?.split_once(")=")?;
    Some(columns)
}

impl StoreError {
    /// Names the column behind a unique violation.
    ///
    /// The constraint name decides. The detail text is only consulted for
    /// its column list, never for the conflicting value.
    pub fn duplicate_field(&self) -> Option<DuplicateField> {
        let StoreError::UniqueViolation { constraint, detail } = self else {
            return None;
        };

        DuplicateField::from_constraint(constraint)
            .or_else(|| detail_column(detail).and_then(DuplicateField::from_column))
    }
}

#[async_trait]
pub trait AttendeeRepository: Send + Sync {
    async fn insert(&self, data: CreateAttendeeData) -> Result<Attendee, StoreError>;

    async fn find(&self, identification: i64) -> Result<Option<Attendee>, StoreError>;

    /// Newest first
    async fn list(&self) -> Result<Vec<Attendee>, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    /// Returns the number of removed rows
    async fn delete(&self, identification: i64) -> Result<u64, StoreError>;

    /// Returns the number of attendees linked to `transaction_id`
    async fn update_payment_status(
        &self,
        transaction_id: i64,
        status: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Sets `entry` only if it is still false
    async fn mark_entry(
        &self,
        identification: i64,
        entry_datetime: &str,
    ) -> Result<Option<Attendee>, StoreError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn insert(&self, data: CreateProfileData) -> Result<LoginProfile, StoreError>;

    async fn find(&self, identification: i64) -> Result<Option<LoginProfile>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<LoginProfile>, StoreError>;

    /// Newest first
    async fn list(&self) -> Result<Vec<LoginProfile>, StoreError>;

    async fn set_token(&self, identification: i64, token: Option<&str>) -> Result<(), StoreError>;

    async fn set_otp(
        &self,
        identification: i64,
        otp: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    /// Also clears the session token
    async fn update_password(&self, identification: i64, password_hash: &str)
        -> Result<(), StoreError>;

    async fn update_role(
        &self,
        identification: i64,
        role: Role,
    ) -> Result<Option<LoginProfile>, StoreError>;

    async fn set_active(
        &self,
        identification: i64,
        is_active: bool,
    ) -> Result<Option<LoginProfile>, StoreError>;
}
