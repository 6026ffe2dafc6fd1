use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use ring::rand::{SecureRandom, SystemRandom};

const SALT_LEN: usize = 16;

#[derive(thiserror::Error, Debug)]
pub enum PasswordError {
    #[error("Failed to generate salt")]
    Salt,

    #[error("Hashing failed: {0}")]
    Hash(String),

    #[error("Invalid hash format: {0}")]
    InvalidHash(String),
}

/// Argon2id hash in PHC string format
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let mut salt_bytes = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt_bytes)
        .map_err(|_| PasswordError::Salt)?;

    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("123", &hash).unwrap());
        assert!(!verify_password("124", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_password("123").unwrap(), hash_password("123").unwrap());
    }

    #[test]
    fn test_invalid_hash() {
        assert!(matches!(
            verify_password("123", "plaintext"),
            Err(PasswordError::InvalidHash(_))
        ));
    }
}
