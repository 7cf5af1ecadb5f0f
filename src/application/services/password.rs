//! Argon2id password hashing.
//!
//! Hashing is CPU-bound, so both operations run on the blocking pool.

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use serde_json::json;

use crate::error::AppError;

fn hashing_error(e: impl std::fmt::Display) -> AppError {
    AppError::internal("Password hashing failed", json!({ "reason": e.to_string() }))
}

/// Hashes a password into a PHC string with a random 16-byte salt.
pub async fn hash_password(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::encode_b64(&rand::random::<[u8; 16]>()).map_err(hashing_error)?;
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(hashing_error)
    })
    .await
    .map_err(hashing_error)?
}

/// Checks a password against a stored PHC string.
///
/// A malformed stored hash is an internal error, a mismatch is `Ok(false)`.
pub async fn verify_password(password: String, stored_hash: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&stored_hash).map_err(hashing_error)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(hashing_error)?
}

/// Random password for accounts created through mobile login.
pub fn random_password() -> String {
    hex::encode(rand::random::<[u8; 24]>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_then_verify() {
        let hash = hash_password("s3cret-pass".to_string()).await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("s3cret-pass".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong-pass1".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_same_password_gets_distinct_salts() {
        let a = hash_password("s3cret-pass".to_string()).await.unwrap();
        let b = hash_password("s3cret-pass".to_string()).await.unwrap();

        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_malformed_hash_is_internal_error() {
        let err = verify_password("x".to_string(), "not-a-phc-string".to_string())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Internal { .. }));
    }

    #[test]
    fn test_random_password_length() {
        assert_eq!(random_password().len(), 48);
    }
}
