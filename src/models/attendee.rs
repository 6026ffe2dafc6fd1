use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

/// Local payment state of an attendee.
///
/// `Pending` is written by the registration saga, `Started` is the state the
/// gateway reports once the payer opened the checkout. Everything else the
/// gateway reports is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Started,
    Reported(String),
}

impl PaymentStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "PENDING" => PaymentStatus::Pending,
            "STARTED" => PaymentStatus::Started,
            other => PaymentStatus::Reported(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Started => "STARTED",
            PaymentStatus::Reported(raw) => raw,
        }
    }

    /// Whether the gateway may still move this payment forward
    pub fn is_pending(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Started)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Attendee {
    pub identification: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub city: String,
    pub distributor: String,
    pub distributor_id: i64,
    pub main_procedure: String,
    pub product_brand: String,
    pub weekly_procedure: String,
    pub contact: bool,
    pub payment_status: Option<String>,
    pub payment_ref: Option<String>,
    pub transaction_id: Option<i64>,
    pub payment_update: Option<DateTime<Utc>>,
    pub entry: bool,
    pub entry_datetime: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Attendee {
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        self.payment_status.as_deref().map(PaymentStatus::parse)
    }

    /// Part of the reconciliation sweep: still pending and linked to a
    /// gateway transaction.
    pub fn awaiting_payment(&self) -> Option<i64> {
        match self.payment_status() {
            Some(status) if status.is_pending() => self.transaction_id,
            _ => None,
        }
    }

    pub fn public_view(&self) -> AttendeeSummary {
        AttendeeSummary {
            identification: self.identification,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            city: self.city.clone(),
        }
    }
}

/// Registration form as submitted by the attendee
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAttendee {
    pub identification: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub city: String,
    pub distributor: String,
    #[serde(default)]
    pub distributor_id: i64,
    pub main_procedure: String,
    pub product_brand: String,
    pub weekly_procedure: String,
    pub contact: bool,
}

/// Fields exposed back to the registrant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendeeSummary {
    pub identification: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub city: String,
}

#[derive(Debug, Clone)]
pub struct CreateAttendeeData {
    pub attendee: NewAttendee,
    pub payment_status: PaymentStatus,
    pub payment_ref: String,
    pub transaction_id: i64,
}

impl Attendee {
    /// Creates a new attendee record
    pub async fn create(pool: &PgPool, data: CreateAttendeeData) -> Result<Self, sqlx::Error> {
        let CreateAttendeeData {
            attendee,
            payment_status,
            payment_ref,
            transaction_id,
        } = data;

        let row = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO assistant (
                identification, first_name, last_name, phone, email, city,
                distributor, distributor_id, main_procedure, product_brand,
                weekly_procedure, contact, payment_status, payment_ref, transaction_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(attendee.identification)
        .bind(attendee.first_name)
        .bind(attendee.last_name)
        .bind(attendee.phone)
        .bind(attendee.email)
        .bind(attendee.city)
        .bind(attendee.distributor)
        .bind(attendee.distributor_id)
        .bind(attendee.main_procedure)
        .bind(attendee.product_brand)
        .bind(attendee.weekly_procedure)
        .bind(attendee.contact)
        .bind(payment_status.as_str())
        .bind(payment_ref)
        .bind(transaction_id)
        .fetch_one(pool)
        .await?;

        Ok(row)
    }

    pub async fn find_by_identification(
        pool: &PgPool,
        identification: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM assistant WHERE identification = $1
            "#,
        )
        .bind(identification)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    /// Lists every attendee, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let rows = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM assistant ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM assistant")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    pub async fn delete(pool: &PgPool, identification: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM assistant WHERE identification = $1
            "#,
        )
        .bind(identification)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Stores the status reported by the gateway for a transaction
    pub async fn update_payment_status(
        pool: &PgPool,
        transaction_id: i64,
        status: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE assistant
            SET payment_status = $2, payment_update = $3
            WHERE transaction_id = $1
            "#,
        )
        .bind(transaction_id)
        .bind(status)
        .bind(updated_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Flags the entry. Returns `None` when the attendee does not exist or
    /// already entered, so the flag can only flip once.
    pub async fn mark_entry(
        pool: &PgPool,
        identification: i64,
        entry_datetime: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let row = sqlx::query_as::<_, Self>(
            r#"
            UPDATE assistant
            SET entry = TRUE, entry_datetime = $2
            WHERE identification = $1 AND entry = FALSE
            RETURNING *
            "#,
        )
        .bind(identification)
        .bind(entry_datetime)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }
}
