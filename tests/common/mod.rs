//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Map;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use event_registration::models::attendee::{Attendee, CreateAttendeeData, NewAttendee};
use event_registration::models::profile::{CreateProfileData, LoginProfile, Role};
use event_registration::services::payment_gateway::{
    GatewayError, PaymentGateway, TransactionRequest, TransactionResult, TransactionStatus,
};
use event_registration::store::{AttendeeRepository, InMemoryStore, ProfileRepository, StoreError};

pub fn sample_attendee(identification: i64, phone: &str, email: &str) -> NewAttendee {
    NewAttendee {
        identification,
        first_name: "Ana".to_string(),
        last_name: "Rojas".to_string(),
        phone: phone.to_string(),
        email: email.to_string(),
        city: "Cali".to_string(),
        distributor: "Norte".to_string(),
        distributor_id: 7,
        main_procedure: "Implants".to_string(),
        product_brand: "Acme".to_string(),
        weekly_procedure: "5".to_string(),
        contact: true,
    }
}

/// In-memory store with switchable failures on the calls the saga depends on
#[derive(Default, Clone)]
pub struct FaultyStore {
    pub inner: InMemoryStore,
    pub fail_count: Arc<AtomicBool>,
    pub fail_profile_insert: Arc<AtomicBool>,
    pub fail_attendee_delete: Arc<AtomicBool>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_count(&self) {
        self.fail_count.store(true, Ordering::SeqCst);
    }

    pub fn fail_profile_insert(&self) {
        self.fail_profile_insert.store(true, Ordering::SeqCst);
    }

    pub fn fail_attendee_delete(&self) {
        self.fail_attendee_delete.store(true, Ordering::SeqCst);
    }

    fn unavailable(flag: &AtomicBool, what: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(format!("{what} disabled for test")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AttendeeRepository for FaultyStore {
    async fn insert(&self, data: CreateAttendeeData) -> Result<Attendee, StoreError> {
        AttendeeRepository::insert(&self.inner, data).await
    }

    async fn find(&self, identification: i64) -> Result<Option<Attendee>, StoreError> {
        AttendeeRepository::find(&self.inner, identification).await
    }

    async fn list(&self) -> Result<Vec<Attendee>, StoreError> {
        AttendeeRepository::list(&self.inner).await
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Self::unavailable(&self.fail_count, "count")?;
        self.inner.count().await
    }

    async fn delete(&self, identification: i64) -> Result<u64, StoreError> {
        Self::unavailable(&self.fail_attendee_delete, "delete")?;
        self.inner.delete(identification).await
    }

    async fn update_payment_status(
        &self,
        transaction_id: i64,
        status: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        self.inner
            .update_payment_status(transaction_id, status, updated_at)
            .await
    }

    async fn mark_entry(
        &self,
        identification: i64,
        entry_datetime: &str,
    ) -> Result<Option<Attendee>, StoreError> {
        self.inner.mark_entry(identification, entry_datetime).await
    }
}

#[async_trait]
impl ProfileRepository for FaultyStore {
    async fn insert(&self, data: CreateProfileData) -> Result<LoginProfile, StoreError> {
        Self::unavailable(&self.fail_profile_insert, "profile insert")?;
        ProfileRepository::insert(&self.inner, data).await
    }

    async fn find(&self, identification: i64) -> Result<Option<LoginProfile>, StoreError> {
        ProfileRepository::find(&self.inner, identification).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<LoginProfile>, StoreError> {
        self.inner.find_by_email(email).await
    }

    async fn list(&self) -> Result<Vec<LoginProfile>, StoreError> {
        ProfileRepository::list(&self.inner).await
    }

    async fn set_token(&self, identification: i64, token: Option<&str>) -> Result<(), StoreError> {
        self.inner.set_token(identification, token).await
    }

    async fn set_otp(
        &self,
        identification: i64,
        otp: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        self.inner.set_otp(identification, otp, expires_at).await
    }

    async fn update_password(
        &self,
        identification: i64,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        self.inner.update_password(identification, password_hash).await
    }

    async fn update_role(
        &self,
        identification: i64,
        role: Role,
    ) -> Result<Option<LoginProfile>, StoreError> {
        self.inner.update_role(identification, role).await
    }

    async fn set_active(
        &self,
        identification: i64,
        is_active: bool,
    ) -> Result<Option<LoginProfile>, StoreError> {
        self.inner.set_active(identification, is_active).await
    }
}

/// Gateway double: numbers transactions from 9 upwards and answers queries
/// from a fixed table.
#[derive(Default)]
pub struct StubGateway {
    pub fail_create: AtomicBool,
    pub created: Mutex<Vec<TransactionRequest>>,
    pub statuses: Mutex<HashMap<i64, String>>,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(self, transaction_id: i64, status: &str) -> Self {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.insert(transaction_id, status.to_string());
        }
        self
    }

    pub fn created(&self) -> Vec<TransactionRequest> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_transaction(
        &self,
        request: &TransactionRequest,
    ) -> Result<TransactionResult, GatewayError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(GatewayError::Upstream {
                status: 503,
                message: "maintenance".to_string(),
            });
        }

        let mut created = self.created.lock().expect("stub gateway lock");
        created.push(request.clone());
        let transaction_id = 8 + created.len() as i64;

        Ok(TransactionResult {
            transaction_id,
            url: format!("https://pay/{transaction_id}"),
        })
    }

    async fn query_transaction(
        &self,
        transaction_id: i64,
    ) -> Result<TransactionStatus, GatewayError> {
        let statuses = self.statuses.lock().expect("stub gateway lock");
        match statuses.get(&transaction_id) {
            Some(status) => Ok(TransactionStatus {
                status_description: status.clone(),
                details: Map::new(),
            }),
            None => Err(GatewayError::TransactionNotFound(transaction_id)),
        }
    }
}
