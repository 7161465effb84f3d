//! Configuration management

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use config::builder::{ConfigBuilder as Builder, DefaultState};
use config::{Config as ConfigBuilder, ConfigError as BuilderError, Environment, File};
use clap::Parser;

/// Secret used when none is configured; startup warns when it is in effect
pub const DEFAULT_JWT_SECRET: &str = "change-this-secret-in-production";

/// Longest token lifetime accepted, ten years in seconds
pub const MAX_TOKEN_TTL: u64 = 10 * 365 * 24 * 60 * 60;

/// Cost factors bcrypt accepts
const BCRYPT_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid server configuration: {0}")]
    InvalidServer(String),

    #[error("Invalid database configuration: {0}")]
    InvalidDatabase(String),

    #[error("Invalid logging configuration: {0}")]
    InvalidLogging(String),

    #[error("Invalid security configuration: {0}")]
    InvalidSecurity(String),

    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

impl From<BuilderError> for ConfigError {
    fn from(err: BuilderError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl Config {
    /// Load configuration with precedence: CLI args > Environment variables > Config file > Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let cli_args = CliArgs::parse();
        Self::load_with(&cli_args, |key| std::env::var(key).ok())
    }

    /// Load configuration from parsed CLI arguments and an environment lookup
    ///
    /// The lookup resolves the unprefixed variables of earlier deployments
    /// (`JWT_SECRET`, `JWT_EXPIRES_IN`, `PORT`, `DATABASE_URL`). Prefixed
    /// `TEXTPERT_*` variables are read from the process environment.
    pub fn load_with<F>(cli_args: &CliArgs, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 1. Start with defaults (lowest priority)
        let mut builder = Self::defaults()?;

        // 2. Load from config file if specified (medium priority)
        if let Some(config_path) = &cli_args.config {
            if !config_path.exists() {
                return Err(ConfigError::FileNotFound(
                    config_path.display().to_string()
                ));
            }
            builder = builder.add_source(File::from(config_path.as_path()));
        }

        // 3. Override with environment variables (higher priority)
        // Prefixed variables use __ for nesting, e.g. TEXTPERT_SERVER__PORT=8080
        builder = builder.add_source(
            Environment::with_prefix("TEXTPERT")
                .separator("__")
                .try_parsing(true)
        );
        builder = apply_legacy_env(builder, lookup)?;

        // 4. Override with CLI arguments (highest priority)
        if let Some(host) = &cli_args.host {
            builder = builder.set_override("server.host", host.clone())?;
        }
        if let Some(port) = cli_args.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(db_path) = &cli_args.database {
            builder = builder.set_override("database.path", db_path.display().to_string())?;
        }
        if let Some(log_level) = &cli_args.log_level {
            builder = builder.set_override("logging.level", log_level.clone())?;
        }

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn defaults() -> Result<Builder<DefaultState>, ConfigError> {
        Ok(ConfigBuilder::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("database.path", "./data/textpert.db")?
            .set_default("database.connection_pool_size", 10)?
            .set_default("database.busy_timeout", 5000)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("logging.output", "stdout")?
            .set_default("logging.max_file_size", 10485760)? // 10 MB
            .set_default("logging.max_backups", 5)?
            .set_default("security.jwt_secret", DEFAULT_JWT_SECRET)?
            .set_default("security.bcrypt_cost", 10)?
            .set_default("security.login_token_ttl", 3600)?
            .set_default("security.registration_token_ttl", 3600)?
            .set_default("security.allowed_origins", vec!["*"])?)
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.database.validate()?;
        self.logging.validate()?;
        self.security.validate()?;
        Ok(())
    }
}

/// Map the unprefixed variables of earlier deployments onto config keys
fn apply_legacy_env<F>(
    mut builder: Builder<DefaultState>,
    lookup: F,
) -> Result<Builder<DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secret) = lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
        builder = builder.set_override("security.jwt_secret", secret)?;
    }

    if let Some(expires_in) = lookup("JWT_EXPIRES_IN").filter(|s| !s.is_empty()) {
        let ttl = parse_token_lifetime(&expires_in).ok_or_else(|| {
            ConfigError::InvalidSecurity(format!("JWT_EXPIRES_IN is not a valid lifetime: {}", expires_in))
        })?;
        builder = builder.set_override("security.registration_token_ttl", ttl.as_secs())?;
    }

    if let Some(port) = lookup("PORT").filter(|s| !s.is_empty()) {
        let port: u16 = port.trim().parse().map_err(|_| {
            ConfigError::InvalidServer(format!("PORT is not a valid port: {}", port))
        })?;
        builder = builder.set_override("server.port", port)?;
    }

    if let Some(url) = lookup("DATABASE_URL").filter(|s| !s.is_empty()) {
        let path = database_path_from_url(&url);
        builder = builder.set_override("database.path", path.display().to_string())?;
    }

    Ok(builder)
}

/// Parse a token lifetime: `"3600"`, `"90s"`, `"1.5h"`, `"10 minutes"`, `"2 days"`, `"1w"`
///
/// Accepts the `ms` package grammar used by the Node deployment: a possibly
/// fractional amount, optional whitespace, then a short or long unit name.
/// A bare number is seconds. Sub-second remainders are truncated.
pub fn parse_token_lifetime(value: &str) -> Option<Duration> {
    let value = value.trim();
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let (amount, unit) = value.split_at(split);
    if amount.is_empty() {
        return None;
    }
    let amount: f64 = amount.parse().ok()?;

    let seconds_per_unit = match unit.trim().to_ascii_lowercase().as_str() {
        "" => 1.0,
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 0.001,
        "s" | "sec" | "secs" | "second" | "seconds" => 1.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600.0,
        "d" | "day" | "days" => 86_400.0,
        "w" | "week" | "weeks" => 604_800.0,
        "y" | "yr" | "yrs" | "year" | "years" => 31_557_600.0,
        _ => return None,
    };

    let seconds = (amount * seconds_per_unit).trunc();
    if !seconds.is_finite() || seconds > MAX_TOKEN_TTL as f64 {
        return None;
    }
    Some(Duration::from_secs(seconds as u64))
}

/// Turn a `DATABASE_URL` into a SQLite file path
pub fn database_path_from_url(url: &str) -> PathBuf {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .or_else(|| url.strip_prefix("file:"))
        .unwrap_or(url);
    PathBuf::from(path)
}

/// Command-line arguments for configuration override
#[derive(Debug, Default, Parser)]
#[command(name = "textpert-backend")]
#[command(about = "Textpert Backend Server", long_about = None)]
pub struct CliArgs {
    /// Path to configuration file (TOML format)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Server host address
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Server port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database file path
    #[arg(short, long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::InvalidServer("host cannot be empty".to_string()));
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidServer("port must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub connection_pool_size: usize,
    pub busy_timeout: u64, // milliseconds
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidDatabase("path cannot be empty".to_string()));
        }

        if self.connection_pool_size == 0 {
            return Err(ConfigError::InvalidDatabase("connection_pool_size must be greater than 0".to_string()));
        }

        if self.busy_timeout == 0 {
            return Err(ConfigError::InvalidDatabase("busy_timeout must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
    pub output: String,
    pub log_file: Option<PathBuf>,
    pub max_file_size: usize, // bytes
    pub max_backups: usize,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("level must be one of: {:?}", valid_levels)
            ));
        }

        let valid_formats = ["json", "text"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("format must be one of: {:?}", valid_formats)
            ));
        }

        let valid_outputs = ["stdout", "file"];
        if !valid_outputs.contains(&self.output.as_str()) {
            return Err(ConfigError::InvalidLogging(
                format!("output must be one of: {:?}", valid_outputs)
            ));
        }

        if self.output == "file" && self.log_file.is_none() {
            return Err(ConfigError::InvalidLogging(
                "log_file must be specified when output is 'file'".to_string()
            ));
        }

        if self.max_file_size == 0 {
            return Err(ConfigError::InvalidLogging("max_file_size must be greater than 0".to_string()));
        }

        if self.max_backups == 0 {
            return Err(ConfigError::InvalidLogging("max_backups must be greater than 0".to_string()));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub bcrypt_cost: u32,
    pub login_token_ttl: u64, // seconds
    pub registration_token_ttl: u64, // seconds
    pub allowed_origins: Vec<String>,
}

impl SecurityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::InvalidSecurity("jwt_secret cannot be empty".to_string()));
        }

        if !BCRYPT_COST_RANGE.contains(&self.bcrypt_cost) {
            return Err(ConfigError::InvalidSecurity(format!(
                "bcrypt_cost must be between {} and {}",
                BCRYPT_COST_RANGE.start(),
                BCRYPT_COST_RANGE.end()
            )));
        }

        for (name, ttl) in [
            ("login_token_ttl", self.login_token_ttl),
            ("registration_token_ttl", self.registration_token_ttl),
        ] {
            if ttl == 0 || ttl > MAX_TOKEN_TTL {
                return Err(ConfigError::InvalidSecurity(format!(
                    "{} must be between 1 and {} seconds",
                    name, MAX_TOKEN_TTL
                )));
            }
        }

        if self.allowed_origins.is_empty() {
            return Err(ConfigError::InvalidSecurity("allowed_origins cannot be empty".to_string()));
        }

        Ok(())
    }

    /// Whether the built-in development secret is in effect
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }

    pub fn login_ttl(&self) -> Duration {
        Duration::from_secs(self.login_token_ttl)
    }

    pub fn registration_ttl(&self) -> Duration {
        Duration::from_secs(self.registration_token_ttl)
    }
}
