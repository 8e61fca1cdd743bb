//! Password hashing and verification with Argon2id.
//!
//! Hashes are stored as PHC strings (`$argon2id$v=19$m=19456,t=2,p=1$...`),
//! which carry their own salt and parameters.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;

use crate::FastwitterError;

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, FastwitterError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| FastwitterError::Password(e.to_string()))?;
    Ok(hash.to_string())
}

/// Checks `password` against a stored PHC hash.
///
/// `Ok(false)` on mismatch; `Err` only when `hash` is not a valid PHC
/// string.
pub fn verify_password(
    password: &str,
    hash: &str,
) -> Result<bool, FastwitterError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| FastwitterError::Password(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// [`hash_password`] on the blocking pool, off the async workers.
pub async fn hash_password_blocking(
    password: String,
) -> Result<String, FastwitterError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_blocking(
    password: String,
    hash: String,
) -> Result<bool, FastwitterError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await?
}
