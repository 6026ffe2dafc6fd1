use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{AttendeeRepository, ProfileRepository, StoreError};
use crate::models::attendee::{Attendee, CreateAttendeeData};
use crate::models::profile::{CreateProfileData, LoginProfile, Role};

/// A thread-safe in-memory store for attendees and login profiles.
///
/// Enforces the same unique keys as the SQL schema and reports violations
/// with the constraint names and detail text PostgreSQL would produce.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    attendees: Arc<RwLock<BTreeMap<i64, Attendee>>>,
    profiles: Arc<RwLock<BTreeMap<i64, LoginProfile>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unique_violation(table: &str, column: &str, value: &str) -> StoreError {
    let constraint = if column == "identification" {
        format!("{table}_pkey")
    } else {
        format!("{table}_{column}_key")
    };

    StoreError::UniqueViolation {
        constraint,
        detail: format!("Key ({column})=({value}) already exists."),
    }
}

/// Checks the unique keys shared by both tables
fn check_unique<'a, I>(
    table: &str,
    rows: I,
    identification: i64,
    phone: &str,
    email: &str,
) -> Result<(), StoreError>
where
    I: IntoIterator<Item = (i64, &'a str, &'a str)>,
{
    for (row_id, row_phone, row_email) in rows {
        if row_id == identification {
            return Err(unique_violation(table, "identification", &identification.to_string()));
        }
        if row_phone == phone {
            return Err(unique_violation(table, "phone", phone));
        }
        if row_email == email {
            return Err(unique_violation(table, "email", email));
        }
    }
    Ok(())
}

#[async_trait]
impl AttendeeRepository for InMemoryStore {
    async fn insert(&self, data: CreateAttendeeData) -> Result<Attendee, StoreError> {
        let mut attendees = self.attendees.write().await;
        let input = data.attendee;

        check_unique(
            "assistant",
            attendees
                .values()
                .map(|a| (a.identification, a.phone.as_str(), a.email.as_str())),
            input.identification,
            &input.phone,
            &input.email,
        )?;

        let attendee = Attendee {
            identification: input.identification,
            first_name: input.first_name,
            last_name: input.last_name,
            phone: input.phone,
            email: input.email,
            city: input.city,
            distributor: input.distributor,
            distributor_id: input.distributor_id,
            main_procedure: input.main_procedure,
            product_brand: input.product_brand,
            weekly_procedure: input.weekly_procedure,
            contact: input.contact,
            payment_status: Some(data.payment_status.as_str().to_string()),
            payment_ref: Some(data.payment_ref),
            transaction_id: Some(data.transaction_id),
            payment_update: None,
            entry: false,
            entry_datetime: None,
            created_at: Utc::now(),
        };

        attendees.insert(attendee.identification, attendee.clone());
        Ok(attendee)
    }

    async fn find(&self, identification: i64) -> Result<Option<Attendee>, StoreError> {
        Ok(self.attendees.read().await.get(&identification).cloned())
    }

    async fn list(&self) -> Result<Vec<Attendee>, StoreError> {
        let mut rows: Vec<Attendee> = self.attendees.read().await.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        Ok(self.attendees.read().await.len() as i64)
    }

    async fn delete(&self, identification: i64) -> Result<u64, StoreError> {
        let removed = self.attendees.write().await.remove(&identification);
        Ok(u64::from(removed.is_some()))
    }

    async fn update_payment_status(
        &self,
        transaction_id: i64,
        status: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut attendees = self.attendees.write().await;
        let mut updated = 0;

        for attendee in attendees
            .values_mut()
            .filter(|a| a.transaction_id == Some(transaction_id))
        {
            attendee.payment_status = Some(status.to_string());
            attendee.payment_update = Some(updated_at);
            updated += 1;
        }

        Ok(updated)
    }

    async fn mark_entry(
        &self,
        identification: i64,
        entry_datetime: &str,
    ) -> Result<Option<Attendee>, StoreError> {
        let mut attendees = self.attendees.write().await;

        match attendees.get_mut(&identification) {
            Some(attendee) if !attendee.entry => {
                attendee.entry = true;
                attendee.entry_datetime = Some(entry_datetime.to_string());
                Ok(Some(attendee.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn insert(&self, data: CreateProfileData) -> Result<LoginProfile, StoreError> {
        let mut profiles = self.profiles.write().await;

        check_unique(
            "users_profile",
            profiles
                .values()
                .map(|p| (p.identification, p.phone.as_str(), p.email.as_str())),
            data.identification,
            &data.phone,
            &data.email,
        )?;

        let profile = LoginProfile {
            identification: data.identification,
            first_name: data.first_name,
            last_name: data.last_name,
            phone: data.phone,
            email: data.email,
            role: data.role.as_str().to_string(),
            password: data.password_hash,
            token: None,
            otp: None,
            otp_expired: None,
            is_active: data.is_active,
            created_at: Utc::now(),
        };

        profiles.insert(profile.identification, profile.clone());
        Ok(profile)
    }

    async fn find(&self, identification: i64) -> Result<Option<LoginProfile>, StoreError> {
        Ok(self.profiles.read().await.get(&identification).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<LoginProfile>, StoreError> {
        Ok(self
            .profiles
            .read()
            .await
            .values()
            .find(|p| p.email == email)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<LoginProfile>, StoreError> {
        let mut rows: Vec<LoginProfile> = self.profiles.read().await.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn set_token(&self, identification: i64, token: Option<&str>) -> Result<(), StoreError> {
        if let Some(profile) = self.profiles.write().await.get_mut(&identification) {
            profile.token = token.map(str::to_string);
        }
        Ok(())
    }

    async fn set_otp(
        &self,
        identification: i64,
        otp: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        if let Some(profile) = self.profiles.write().await.get_mut(&identification) {
            profile.otp = otp.map(str::to_string);
            profile.otp_expired = expires_at;
        }
        Ok(())
    }

    async fn update_password(
        &self,
        identification: i64,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        if let Some(profile) = self.profiles.write().await.get_mut(&identification) {
            profile.password = password_hash.to_string();
            profile.token = None;
        }
        Ok(())
    }

    async fn update_role(
        &self,
        identification: i64,
        role: Role,
    ) -> Result<Option<LoginProfile>, StoreError> {
        let mut profiles = self.profiles.write().await;
        Ok(profiles.get_mut(&identification).map(|profile| {
            profile.role = role.as_str().to_string();
            profile.clone()
        }))
    }

    async fn set_active(
        &self,
        identification: i64,
        is_active: bool,
    ) -> Result<Option<LoginProfile>, StoreError> {
        let mut profiles = self.profiles.write().await;
        Ok(profiles.get_mut(&identification).map(|profile| {
            profile.is_active = is_active;
            profile.clone()
        }))
    }
}
