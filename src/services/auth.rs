use chrono::{Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::Arc;

use crate::models::profile::{LoginProfile, Role};
use crate::services::password::{self, PasswordError};
use crate::services::tokens::{TokenError, TokenIssuer, TokenPurpose};
use crate::store::{ProfileRepository, StoreError};

pub const OTP_TTL_MINUTES: i64 = 5;

#[derive(thiserror::Error, Debug)]
pub enum AuthServiceError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email not found")]
    EmailNotFound,

    #[error("The code has expired, please request a new one")]
    OtpExpired,

    #[error("The code is not valid")]
    OtpInvalid,

    #[error("Token not valid for password reset")]
    WrongTokenPurpose,

    #[error("Could not generate a one-time code")]
    OtpGeneration,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub profile: LoginProfile,
    pub token: String,
}

/// Identity attached to a request carrying a valid session token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub identification: i64,
    pub role: Role,
}

#[derive(Clone)]
pub struct AuthService {
    profiles: Arc<dyn ProfileRepository>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(profiles: Arc<dyn ProfileRepository>, tokens: TokenIssuer) -> Self {
        Self { profiles, tokens }
    }

    /// Checks the password and stores a fresh session token on the profile
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthServiceError> {
        let profile = self
            .profiles
            .find_by_email(email)
            .await?
            .filter(|p| p.is_active)
            .ok_or(AuthServiceError::InvalidCredentials)?;

        if !password::verify_password(password, &profile.password)? {
            return Err(AuthServiceError::InvalidCredentials);
        }

        let role = profile.role().ok_or(AuthServiceError::InvalidCredentials)?;
        let token = self.tokens.issue_session(profile.identification, role)?;
        self.profiles
            .set_token(profile.identification, Some(&token))
            .await?;

        tracing::info!(identification = profile.identification, "User logged in");

        Ok(LoginResult { profile, token })
    }

    pub async fn logout(&self, identification: i64) -> Result<(), AuthServiceError> {
        self.profiles.set_token(identification, None).await?;
        tracing::info!(identification, "User logged out");
        Ok(())
    }

    /// Resolves a bearer token to the user it was issued to. The token must
    /// still be the one stored on an active profile, so logout and password
    /// resets revoke it.
    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthServiceError> {
        let claims = self.tokens.decode(token)?;
        if claims.purpose != TokenPurpose::Session {
            return Err(AuthServiceError::InvalidCredentials);
        }

        let identification = claims
            .identification()
            .ok_or(AuthServiceError::InvalidCredentials)?;

        let profile = self
            .profiles
            .find(identification)
            .await?
            .filter(|p| p.is_active && p.token.as_deref() == Some(token))
            .ok_or(AuthServiceError::InvalidCredentials)?;

        let role = profile.role().ok_or(AuthServiceError::InvalidCredentials)?;

        Ok(AuthenticatedUser {
            identification,
            role,
        })
    }

    /// Stores a six digit one-time code valid for five minutes. Delivering
    /// it to the user is left to the mail integration.
    #[tracing::instrument(skip(self))]
    pub async fn password_recovery(&self, email: &str) -> Result<(), AuthServiceError> {
        let profile = self
            .profiles
            .find_by_email(email)
            .await?
            .ok_or(AuthServiceError::EmailNotFound)?;

        let otp = generate_otp()?;
        let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);

        self.profiles
            .set_otp(profile.identification, Some(&otp), Some(expires_at))
            .await?;

        tracing::info!(
            identification = profile.identification,
            expires_at = %expires_at,
            "Password recovery code issued"
        );

        Ok(())
    }

    /// Consumes a valid one-time code and returns a short-lived reset token
    #[tracing::instrument(skip(self, code))]
    pub async fn validate_otp(&self, email: &str, code: &str) -> Result<String, AuthServiceError> {
        let profile = self
            .profiles
            .find_by_email(email)
            .await?
            .ok_or(AuthServiceError::EmailNotFound)?;

        match profile.otp_expired {
            Some(expires_at) if Utc::now() <= expires_at => {}
            _ => return Err(AuthServiceError::OtpExpired),
        }

        if profile.otp.as_deref() != Some(code) {
            return Err(AuthServiceError::OtpInvalid);
        }

        self.profiles
            .set_otp(profile.identification, None, None)
            .await?;

        let role = profile.role().ok_or(AuthServiceError::InvalidCredentials)?;
        let reset_token =
            self.tokens
                .issue_password_reset(profile.identification, role, &profile.email)?;

        Ok(reset_token)
    }

    /// Replaces the password and ends any open session
    #[tracing::instrument(skip(self, reset_token, new_password))]
    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), AuthServiceError> {
        let claims = self.tokens.decode(reset_token)?;
        if claims.purpose != TokenPurpose::PasswordReset {
            return Err(AuthServiceError::WrongTokenPurpose);
        }

        let identification = claims
            .identification()
            .ok_or(AuthServiceError::WrongTokenPurpose)?;

        let password_hash = password::hash_password(new_password)?;
        self.profiles
            .update_password(identification, &password_hash)
            .await?;

        tracing::info!(identification, "Password reset");

        Ok(())
    }
}

fn generate_otp() -> Result<String, AuthServiceError> {
    let mut bytes = [0u8; 4];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AuthServiceError::OtpGeneration)?;

    let code = 100_000 + u32::from_be_bytes(bytes) % 900_000;
    Ok(code.to_string())
}
