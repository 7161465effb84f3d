pub mod system;

pub use system::*;

use crate::auth::credentials::CredentialManager;
use crate::db::repository::AccountStore;
use std::sync::Arc;

/// Shared application state for handlers
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub credentials: Arc<CredentialManager>,
}

impl AppState {
    pub fn new(accounts: Arc<dyn AccountStore>, credentials: Arc<CredentialManager>) -> Self {
        Self { accounts, credentials }
    }
}
