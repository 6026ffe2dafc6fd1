use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
    Admin,
    Superadmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Assistant => "assistant",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "assistant" => Some(Role::Assistant),
            "admin" => Some(Role::Admin),
            "superadmin" => Some(Role::Superadmin),
            _ => None,
        }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Superadmin)
    }
}

/// Authentication record of an attendee or staff member
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct LoginProfile {
    pub identification: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub role: String, // "assistant", "admin" or "superadmin"
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing)]
    pub token: Option<String>,
    #[serde(skip_serializing)]
    pub otp: Option<String>,
    #[serde(skip_serializing)]
    pub otp_expired: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl LoginProfile {
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }
}

#[derive(Debug, Clone)]
pub struct CreateProfileData {
    pub identification: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub is_active: bool,
}

impl LoginProfile {
    pub async fn create(pool: &PgPool, data: CreateProfileData) -> Result<Self, sqlx::Error> {
        let profile = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO users_profile (
                identification, first_name, last_name, phone, email, role, password, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(data.identification)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.phone)
        .bind(data.email)
        .bind(data.role.as_str())
        .bind(data.password_hash)
        .bind(data.is_active)
        .fetch_one(pool)
        .await?;

        Ok(profile)
    }

    pub async fn find_by_identification(
        pool: &PgPool,
        identification: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        let profile = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM users_profile WHERE identification = $1
            "#,
        )
        .bind(identification)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let profile = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM users_profile WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    /// Lists every profile, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        let profiles = sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM users_profile ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(profiles)
    }

    pub async fn set_token(
        pool: &PgPool,
        identification: i64,
        token: Option<&str>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users_profile SET token = $2 WHERE identification = $1
            "#,
        )
        .bind(identification)
        .bind(token)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn set_otp(
        pool: &PgPool,
        identification: i64,
        otp: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users_profile SET otp = $2, otp_expired = $3 WHERE identification = $1
            "#,
        )
        .bind(identification)
        .bind(otp)
        .bind(expires_at)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Replaces the password hash and drops the active session token
    pub async fn update_password(
        pool: &PgPool,
        identification: i64,
        password_hash: &str,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users_profile SET password = $2, token = NULL WHERE identification = $1
            "#,
        )
        .bind(identification)
        .bind(password_hash)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn update_role(
        pool: &PgPool,
        identification: i64,
        role: Role,
    ) -> Result<Option<Self>, sqlx::Error> {
        let profile = sqlx::query_as::<_, Self>(
            r#"
            UPDATE users_profile SET role = $2 WHERE identification = $1
            RETURNING *
            "#,
        )
        .bind(identification)
        .bind(role.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }

    pub async fn set_active(
        pool: &PgPool,
        identification: i64,
        is_active: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        let profile = sqlx::query_as::<_, Self>(
            r#"
            UPDATE users_profile SET is_active = $2 WHERE identification = $1
            RETURNING *
            "#,
        )
        .bind(identification)
        .bind(is_active)
        .fetch_optional(pool)
        .await?;

        Ok(profile)
    }
}
