//! Authentication module
//!
//! This module provides authentication functionality including:
//! - Password hashing and token issuance (`CredentialManager`)
//! - Bearer token authentication middleware
//! - Account handlers: registration, login, password and profile changes

pub mod credentials;
pub mod jwt;
pub mod password;
pub mod handlers;
pub mod middleware;
pub mod models;

pub use credentials::CredentialManager;
pub use jwt::{Claims, TokenError};
pub use middleware::{authenticate, authenticate_header, AuthUser};
pub use handlers::{change_password, get_me, login, register, update_company, update_me};
