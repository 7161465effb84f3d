//! JWT token generation and validation

use crate::core::error::{AuthFailure, Result, TextpertError};
use crate::db::models::UserId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    pub iat: i64,
    pub exp: i64,
}

/// Why a token was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed or its signature does not verify")]
    Malformed,
    #[error("token has expired")]
    Expired,
}

impl From<TokenError> for TextpertError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Malformed => TextpertError::Unauthorized(AuthFailure::InvalidToken),
            TokenError::Expired => TextpertError::Unauthorized(AuthFailure::TokenExpired),
        }
    }
}

/// Current Unix time in seconds
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Generate a signed token for `user_id`, issued at `issued_at` and valid for `ttl`
pub fn generate_token(
    user_id: UserId,
    ttl: Duration,
    issued_at: i64,
    key: &EncodingKey,
) -> Result<String> {
    let exp = i64::try_from(ttl.as_secs())
        .ok()
        .and_then(|ttl| issued_at.checked_add(ttl))
        .ok_or_else(|| TextpertError::Internal("Failed to calculate expiration".to_string()))?;

    let claims = Claims {
        user_id,
        iat: issued_at,
        exp,
    };

    encode(&Header::new(Algorithm::HS256), &claims, key)
        .map_err(|e| TextpertError::Internal(format!("Failed to generate token: {}", e)))
}

/// Validate a token as of `now` and extract its claims
///
/// The signature is checked first, so a tampered token is always
/// `Malformed`. A token is expired once `now` reaches `exp`.
pub fn validate_token(
    token: &str,
    now: i64,
    key: &DecodingKey,
) -> std::result::Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    // Expiry is compared against the caller's clock below
    validation.validate_exp = false;

    let claims = decode::<Claims>(token, key, &validation)
        .map_err(|e| {
            tracing::debug!(error = %e, "Token rejected");
            TokenError::Malformed
        })?
        .claims;

    if now >= claims.exp {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}
