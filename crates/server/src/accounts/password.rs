//! Argon2id password hashing.
//!
//! Hashes are PHC strings (`$argon2id$v=19$...`) carrying their own salt and
//! parameters, so verification needs nothing but the stored string.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

/// Errors from the password hashing layer.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Hashing failed (parameters or RNG).
    #[error("failed to hash password: {0}")]
    Hash(String),

    /// The stored hash is not a valid PHC string.
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Hash `password` with Argon2id and a fresh random salt.
///
/// CPU-bound; call from a blocking context.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check `password` against a stored PHC hash.
///
/// Returns `Ok(false)` on mismatch; errors only for an unparseable hash.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Fixed salt for [`verify_unknown_user`].
const UNKNOWN_USER_SALT: &str = "a2VlcGVyLXVua25vd24tdXNlcg";

/// Spend the Argon2 work of a [`verify_password`] call for a login that has
/// no stored hash. Always `false`.
pub fn verify_unknown_user(password: &str) -> bool {
    if let Ok(salt) = SaltString::from_b64(UNKNOWN_USER_SALT) {
        let _ = Argon2::default().hash_password(password.as_bytes(), &salt);
    }
    false
}
