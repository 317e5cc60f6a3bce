//! Password hashing and verification using Argon2
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=…,t=…,p=…$salt$digest`), so the
//! cost parameters travel with each hash and verification always re-derives
//! with the parameters that produced it.

use argon2::{
    Argon2,
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::rngs::OsRng;

use crate::error::AuthError;

/// Valid Argon2 hash that no password matches, used to keep login timing
/// uniform when the account does not exist.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dGltaW5nX2F0dGFja19wcmV2ZW50aW9u$K8rI5T7VdQ8xkO0GqK5K2w";

/// Hash a password using Argon2id with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(format!("failed to hash password: {e}")))
}

/// Verify a password against a stored hash
///
/// A wrong password yields `PasswordMismatch`; an unparseable stored hash
/// is an internal fault and yields `Hashing`.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AuthError::Hashing(format!("invalid password hash format: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(()),
        Err(password_hash::Error::Password) => Err(AuthError::PasswordMismatch),
        Err(e) => Err(AuthError::Hashing(format!("failed to verify password: {e}"))),
    }
}

/// Burn the same CPU time as a real verification, discarding the outcome
pub fn verify_against_dummy(password: &str) {
    let _ = verify_password(password, DUMMY_HASH);
}
