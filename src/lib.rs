//! Textpert Backend Library
//!
//! User accounts over HTTP: registration, login, password changes and
//! profile updates, guarded by bearer-token authentication.

pub mod api;
pub mod auth;
pub mod core;
pub mod db;

// Re-export commonly used types
pub use api::{ApiServer, AppState};
pub use auth::CredentialManager;
pub use crate::core::Config;
pub use db::{AccountStore, DatabaseManager, UserRepository};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
