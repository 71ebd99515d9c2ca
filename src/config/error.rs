//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Failed to read env file: {0}")]
    EnvFile(#[from] dotenvy::Error),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool max_connections must be positive")]
    InvalidPoolSize,

    #[error("Pool acquire timeout must be positive")]
    InvalidAcquireTimeout,

    #[error("Token secret must be at least 32 bytes in production")]
    TokenSecretTooShort,

    #[error("Token lifetime must be positive")]
    InvalidTokenTtl,

    #[error("Default comment page size must be between 1 and 500")]
    InvalidPageSize,
}
