//! PostgreSQL backend settings

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::storage::StorageKind;

/// Settings read by `adapters::postgres::connect`.
///
/// Every field has a default so that in-memory deployments can omit the
/// whole section. The URL may embed a password and is kept secret.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://` connection URL
    #[serde(default)]
    pub url: Option<SecretString>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection before failing the call
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Apply the bundled schema migrations on startup
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    /// The connection URL, if one was configured.
    pub fn url(&self) -> Option<&str> {
        self.url.as_ref().map(|url| url.expose_secret().as_str())
    }

    /// Check the section for the selected backend.
    ///
    /// Only the postgres backend reads these settings; any other backend
    /// accepts the section as it is.
    pub fn validate(&self, storage: StorageKind) -> Result<(), ValidationError> {
        if storage != StorageKind::Postgres {
            return Ok(());
        }

        let url = self
            .url()
            .filter(|url| !url.is_empty())
            .ok_or(ValidationError::MissingRequired("DATABASE__URL"))?;
        if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.max_connections == 0 {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.acquire_timeout_secs == 0 {
            return Err(ValidationError::InvalidAcquireTimeout);
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            run_migrations: false,
        }
    }
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}
