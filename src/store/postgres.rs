use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{AttendeeRepository, ProfileRepository, StoreError};
use crate::models::attendee::{Attendee, CreateAttendeeData};
use crate::models::profile::{CreateProfileData, LoginProfile, Role};

/// PostgreSQL adapter over the `assistant` and `users_profile` tables
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendeeRepository for PgStore {
    async fn insert(&self, data: CreateAttendeeData) -> Result<Attendee, StoreError> {
        Ok(Attendee::create(&self.pool, data).await?)
    }

    async fn find(&self, identification: i64) -> Result<Option<Attendee>, StoreError> {
        Ok(Attendee::find_by_identification(&self.pool, identification).await?)
    }

    async fn list(&self) -> Result<Vec<Attendee>, StoreError> {
        Ok(Attendee::list(&self.pool).await?)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(Attendee::count(&self.pool).await?)
    }

    async fn delete(&self, identification: i64) -> Result<u64, StoreError> {
        Ok(Attendee::delete(&self.pool, identification).await?)
    }

    async fn update_payment_status(
        &self,
        transaction_id: i64,
        status: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        Ok(Attendee::update_payment_status(&self.pool, transaction_id, status, updated_at).await?)
    }

    async fn mark_entry(
        &self,
        identification: i64,
        entry_datetime: &str,
    ) -> Result<Option<Attendee>, StoreError> {
        Ok(Attendee::mark_entry(&self.pool, identification, entry_datetime).await?)
    }
}

#[async_trait]
impl ProfileRepository for PgStore {
    async fn insert(&self, data: CreateProfileData) -> Result<LoginProfile, StoreError> {
        Ok(LoginProfile::create(&self.pool, data).await?)
    }

    async fn find(&self, identification: i64) -> Result<Option<LoginProfile>, StoreError> {
        Ok(LoginProfile::find_by_identification(&self.pool, identification).await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<LoginProfile>, StoreError> {
        Ok(LoginProfile::find_by_email(&self.pool, email).await?)
    }

    async fn list(&self) -> Result<Vec<LoginProfile>, StoreError> {
        Ok(LoginProfile::list(&self.pool).await?)
    }

    async fn set_token(&self, identification: i64, token: Option<&str>) -> Result<(), StoreError> {
        LoginProfile::set_token(&self.pool, identification, token).await?;
        Ok(())
    }

    async fn set_otp(
        &self,
        identification: i64,
        otp: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        LoginProfile::set_otp(&self.pool, identification, otp, expires_at).await?;
        Ok(())
    }

    async fn update_password(
        &self,
        identification: i64,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        LoginProfile::update_password(&self.pool, identification, password_hash).await?;
        Ok(())
    }

    async fn update_role(
        &self,
        identification: i64,
        role: Role,
    ) -> Result<Option<LoginProfile>, StoreError> {
        Ok(LoginProfile::update_role(&self.pool, identification, role).await?)
    }

    async fn set_active(
        &self,
        identification: i64,
        is_active: bool,
    ) -> Result<Option<LoginProfile>, StoreError> {
        Ok(LoginProfile::set_active(&self.pool, identification, is_active).await?)
    }
}
