//! Password hashing and verification using bcrypt

use crate::core::error::{Result, TextpertError};

/// Hash a password using bcrypt with the given cost factor
///
/// The salt is random, so hashing the same password twice yields different
/// strings. A failure here means the cost factor is misconfigured.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost)
        .map_err(|e| TextpertError::ConfigError(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored hash
///
/// Returns `false` for a wrong password and for a stored hash bcrypt cannot
/// parse; the latter is logged since it points at corrupt data.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match bcrypt::verify(password, hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash could not be verified");
            false
        }
    }
}
