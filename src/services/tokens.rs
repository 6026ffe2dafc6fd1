use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::models::profile::Role;

pub const SESSION_TTL_HOURS: i64 = 24;
pub const PASSWORD_RESET_TTL_MINUTES: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Session,
    PasswordReset,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String, // identification
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub purpose: TokenPurpose,
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn identification(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TokenError {
    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Token encoding failed: {0}")]
    Encoding(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(err.to_string()),
        }
    }
}

/// HS256 tokens for login sessions and password resets
#[derive(Clone)]
pub struct TokenIssuer {
    secret: Secret<String>,
}

impl TokenIssuer {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    pub fn issue_session(&self, identification: i64, role: Role) -> Result<String, TokenError> {
        self.issue(
            identification,
            role,
            None,
            TokenPurpose::Session,
            Duration::hours(SESSION_TTL_HOURS),
        )
    }

    pub fn issue_password_reset(
        &self,
        identification: i64,
        role: Role,
        email: &str,
    ) -> Result<String, TokenError> {
        self.issue(
            identification,
            role,
            Some(email.to_string()),
            TokenPurpose::PasswordReset,
            Duration::minutes(PASSWORD_RESET_TTL_MINUTES),
        )
    }

    fn issue(
        &self,
        identification: i64,
        role: Role,
        email: Option<String>,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: identification.to_string(),
            role,
            email,
            purpose,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )
        .map_err(|e| TokenError::Encoding(e.to_string()))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &validation,
        )?;

        Ok(data.claims)
    }
}
