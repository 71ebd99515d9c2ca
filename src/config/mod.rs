//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `DISCUSSION` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use discussion_core::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Storage backend: {:?}", config.storage.kind);
//! ```

mod auth;
mod comments;
mod database;
mod error;
mod runtime;
mod storage;

pub use auth::AuthConfig;
pub use comments::CommentsConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use runtime::{Environment, RuntimeConfig};
pub use storage::{StorageConfig, StorageKind};

use serde::Deserialize;
use std::path::Path;

const ENV_PREFIX: &str = "DISCUSSION";

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Environment name and logging
    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Storage backend selection
    #[serde(default)]
    pub storage: StorageConfig,

    /// PostgreSQL connection (used by the postgres backend only)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Access token signing
    pub auth: AuthConfig,

    /// Comment listing defaults
    #[serde(default)]
    pub comments: CommentsConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `DISCUSSION` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `DISCUSSION__STORAGE__KIND=postgres` -> `storage.kind = postgres`
    /// - `DISCUSSION__DATABASE__URL=...` -> `database.url = ...`
    /// - `DISCUSSION__AUTH__TOKEN_SECRET=...` -> `auth.token_secret = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();
        Self::from_environment()
    }

    /// Load configuration after reading variables from a specific env file.
    ///
    /// Variables already present in the process environment win over the file.
    pub fn load_from_env_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenvy::from_path(path.as_ref())?;
        Self::from_environment()
    }

    fn from_environment() -> Result<Self, ConfigError> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// The `database` section is only checked when the postgres backend is
    /// selected; see [`DatabaseConfig::validate`].
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.runtime.validate()?;
        self.database.validate(self.storage.kind)?;
        self.auth.validate(&self.runtime.environment)?;
        self.comments.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.runtime.is_production()
    }
}
