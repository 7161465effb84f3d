//! Textpert Backend - user account service

use textpert_backend::{api, auth, core, db};

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (handles CLI args, env vars, and config file)
    let config = match core::config::Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Print error to stderr since logging isn't initialized yet
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let _logger = match core::Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return Err(e);
        }
    };

    info!("Starting Textpert Backend v{}", textpert_backend::VERSION);
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Server configuration"
    );
    info!(
        path = ?config.database.path,
        pool_size = config.database.connection_pool_size,
        "Database configuration"
    );

    if config.security.uses_default_secret() {
        warn!("Using the built-in JWT secret; set JWT_SECRET or security.jwt_secret in production");
    }

    let db = Arc::new(
        db::DatabaseManager::new(
            &config.database.path,
            config.database.connection_pool_size as u32,
            std::time::Duration::from_millis(config.database.busy_timeout),
        )
        .with_context(|| format!("Failed to open database at {:?}", config.database.path))?,
    );
    info!("Database initialized successfully");

    let accounts = Arc::new(db::UserRepository::new(db));
    let credentials = Arc::new(auth::CredentialManager::from_config(&config.security));
    let state = api::AppState::new(accounts, credentials);

    let server = api::ApiServer::new(&config, state);
    info!(
        url = %format!("http://{}:{}", config.server.host, config.server.port),
        "Server ready - starting to serve requests"
    );

    // Start serving (this will block until shutdown signal)
    server.serve().await?;

    Ok(())
}
