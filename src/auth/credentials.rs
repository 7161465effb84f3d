//! Credential manager
//!
//! Owns the process-wide signing secret and bcrypt cost. Built once at
//! startup and shared read-only by every request.

use crate::auth::jwt::{self, TokenError};
use crate::auth::password;
use crate::core::config::SecurityConfig;
use crate::core::error::{Result, TextpertError};
use crate::db::models::UserId;
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Hashed on first use so unknown accounts cost the same bcrypt work as known ones
const DECOY_PASSWORD: &str = "textpert-decoy-password";

#[derive(Clone)]
pub struct CredentialManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    bcrypt_cost: u32,
    login_ttl: Duration,
    registration_ttl: Duration,
    decoy_hash: OnceLock<String>,
}

impl CredentialManager {
    pub fn new(secret: &str, bcrypt_cost: u32, login_ttl: Duration, registration_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            bcrypt_cost,
            login_ttl,
            registration_ttl,
            decoy_hash: OnceLock::new(),
        }
    }

    pub fn from_config(config: &SecurityConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            config.bcrypt_cost,
            config.login_ttl(),
            config.registration_ttl(),
        )
    }

    pub fn login_ttl(&self) -> Duration {
        self.login_ttl
    }

    pub fn registration_ttl(&self) -> Duration {
        self.registration_ttl
    }

    /// One-way salted hash of `password`
    pub fn hash(&self, password: &str) -> Result<String> {
        password::hash_password(password, self.bcrypt_cost)
    }

    /// Whether `password` matches `hashed`; never an error
    pub fn verify(&self, password: &str, hashed: &str) -> bool {
        password::verify_password(password, hashed)
    }

    /// [`hash`](Self::hash) on the blocking pool
    pub async fn hash_blocking(self: &Arc<Self>, password: String) -> Result<String> {
        let manager = Arc::clone(self);
        tokio::task::spawn_blocking(move || manager.hash(&password))
            .await
            .map_err(|e| TextpertError::TaskError(format!("Password hashing task panicked: {}", e)))?
    }

    /// [`verify`](Self::verify) on the blocking pool
    pub async fn verify_blocking(self: &Arc<Self>, password: String, hashed: String) -> Result<bool> {
        let manager = Arc::clone(self);
        tokio::task::spawn_blocking(move || manager.verify(&password, &hashed))
            .await
            .map_err(|e| TextpertError::TaskError(format!("Password verification task panicked: {}", e)))
    }

    /// Burn one bcrypt verification for an account that does not exist
    ///
    /// Always `false`; keeps login timing independent of whether the email is
    /// registered.
    pub async fn verify_missing_blocking(self: &Arc<Self>, password: String) -> Result<bool> {
        let manager = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let decoy = manager.decoy_hash()?;
            manager.verify(&password, decoy);
            Ok(false)
        })
        .await
        .map_err(|e| TextpertError::TaskError(format!("Password verification task panicked: {}", e)))?
    }

    fn decoy_hash(&self) -> Result<&str> {
        if let Some(hash) = self.decoy_hash.get() {
            return Ok(hash.as_str());
        }
        let hash = self.hash(DECOY_PASSWORD)?;
        Ok(self.decoy_hash.get_or_init(|| hash).as_str())
    }

    pub fn issue_token(&self, principal: UserId, ttl: Duration) -> Result<String> {
        self.issue_token_at(principal, ttl, jwt::now())
    }

    pub fn issue_token_at(&self, principal: UserId, ttl: Duration, now: i64) -> Result<String> {
        jwt::generate_token(principal, ttl, now, &self.encoding_key)
    }

    /// Token handed out by `/login`
    pub fn login_token(&self, principal: UserId) -> Result<String> {
        self.issue_token(principal, self.login_ttl)
    }

    /// Token handed out by `/register`
    pub fn registration_token(&self, principal: UserId) -> Result<String> {
        self.issue_token(principal, self.registration_ttl)
    }

    pub fn verify_token(&self, token: &str) -> std::result::Result<UserId, TokenError> {
        self.verify_token_at(token, jwt::now())
    }

    pub fn verify_token_at(&self, token: &str, now: i64) -> std::result::Result<UserId, TokenError> {
        jwt::validate_token(token, now, &self.decoding_key).map(|claims| claims.user_id)
    }
}
