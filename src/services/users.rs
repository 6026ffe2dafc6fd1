use serde::Deserialize;
use std::sync::Arc;

use crate::models::profile::{CreateProfileData, LoginProfile, Role};
use crate::services::password::{self, PasswordError};
use crate::store::{DuplicateField, ProfileRepository, StoreError};

#[derive(thiserror::Error, Debug)]
pub enum UserError {
    #[error("User with identification {0} not found")]
    NotFound(i64),

    #[error("{}", .0.message())]
    DuplicateField(DuplicateField),

    #[error("The role of a superadmin cannot be changed")]
    SuperadminImmutable,

    #[error("The superadmin role cannot be assigned")]
    SuperadminNotAssignable,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for UserError {
    fn from(err: StoreError) -> Self {
        match err.duplicate_field() {
            Some(field) => UserError::DuplicateField(field),
            None => UserError::Store(err),
        }
    }
}

/// Staff account onboarding form
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub identification: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Clone)]
pub struct UserService {
    profiles: Arc<dyn ProfileRepository>,
}

impl UserService {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    /// Creates an active admin whose initial password is the identification
    #[tracing::instrument(skip(self, user), fields(identification = user.identification))]
    pub async fn create(&self, user: NewUser) -> Result<LoginProfile, UserError> {
        let password_hash = password::hash_password(&user.identification.to_string())?;

        let profile = self
            .profiles
            .insert(CreateProfileData {
                identification: user.identification,
                first_name: user.first_name,
                last_name: user.last_name,
                phone: user.phone,
                email: user.email,
                role: Role::Admin,
                password_hash,
                is_active: true,
            })
            .await?;

        tracing::info!("Staff user created");

        Ok(profile)
    }

    pub async fn list(&self) -> Result<Vec<LoginProfile>, UserError> {
        Ok(self.profiles.list().await?)
    }

    pub async fn find(&self, identification: i64) -> Result<LoginProfile, UserError> {
        self.profiles
            .find(identification)
            .await?
            .ok_or(UserError::NotFound(identification))
    }

    /// Superadmins are neither demoted nor created through this path
    #[tracing::instrument(skip(self))]
    pub async fn update_role(
        &self,
        identification: i64,
        role: Role,
    ) -> Result<LoginProfile, UserError> {
        let current = self.find(identification).await?;

        if current.role() == Some(Role::Superadmin) {
            return Err(UserError::SuperadminImmutable);
        }
        if role == Role::Superadmin {
            return Err(UserError::SuperadminNotAssignable);
        }

        let updated = self
            .profiles
            .update_role(identification, role)
            .await?
            .ok_or(UserError::NotFound(identification))?;

        tracing::info!(role = role.as_str(), "User role updated");

        Ok(updated)
    }

    #[tracing::instrument(skip(self))]
    pub async fn toggle_status(&self, identification: i64) -> Result<LoginProfile, UserError> {
        let current = self.find(identification).await?;

        let updated = self
            .profiles
            .set_active(identification, !current.is_active)
            .await?
            .ok_or(UserError::NotFound(identification))?;

        tracing::info!(is_active = updated.is_active, "User status toggled");

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn new_user(identification: i64, phone: &str, email: &str) -> NewUser {
        NewUser {
            identification,
            first_name: "Luis".to_string(),
            last_name: "Mora".to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
        }
    }

    async fn superadmin(store: &InMemoryStore) {
        ProfileRepository::insert(
            store,
            CreateProfileData {
                identification: 1,
                first_name: "Root".to_string(),
                last_name: "User".to_string(),
                phone: "000".to_string(),
                email: "root@x.com".to_string(),
                role: Role::Superadmin,
                password_hash: "hash".to_string(),
                is_active: true,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_create_admin_with_identification_password() {
        let store = InMemoryStore::new();
        let service = UserService::new(Arc::new(store));

        let profile = service.create(new_user(42, "555", "l@x.com")).await.unwrap();

        assert_eq!(profile.role(), Some(Role::Admin));
        assert!(profile.is_active);
        assert!(password::verify_password("42", &profile.password).unwrap());
    }

    #[tokio::test]
    async fn test_create_duplicate_email() {
        let service = UserService::new(Arc::new(InMemoryStore::new()));
        service.create(new_user(42, "555", "l@x.com")).await.unwrap();

        let err = service.create(new_user(43, "556", "l@x.com")).await.unwrap_err();
        assert!(matches!(err, UserError::DuplicateField(DuplicateField::Email)));
    }

    #[tokio::test]
    async fn test_superadmin_role_is_protected() {
        let store = InMemoryStore::new();
        superadmin(&store).await;
        let service = UserService::new(Arc::new(store));
        service.create(new_user(42, "555", "l@x.com")).await.unwrap();

        assert!(matches!(
            service.update_role(1, Role::Admin).await,
            Err(UserError::SuperadminImmutable)
        ));
        assert!(matches!(
            service.update_role(42, Role::Superadmin).await,
            Err(UserError::SuperadminNotAssignable)
        ));
        assert_eq!(service.find(1).await.unwrap().role(), Some(Role::Superadmin));

        let updated = service.update_role(42, Role::Assistant).await.unwrap();
        assert_eq!(updated.role(), Some(Role::Assistant));
    }

    #[tokio::test]
    async fn test_toggle_status() {
        let service = UserService::new(Arc::new(InMemoryStore::new()));
        service.create(new_user(42, "555", "l@x.com")).await.unwrap();

        assert!(!service.toggle_status(42).await.unwrap().is_active);
        assert!(service.toggle_status(42).await.unwrap().is_active);
        assert!(matches!(
            service.toggle_status(7).await,
            Err(UserError::NotFound(7))
        ));
    }
}
