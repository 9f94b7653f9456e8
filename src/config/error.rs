//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("JWT secret must not be empty")]
    EmptyJwtSecret,

    #[error("Heartbeat interval must be at least 1 second")]
    InvalidHeartbeatInterval,

    #[error("Rate limit window must be at least 1 second")]
    InvalidRateLimitWindow,

    #[error("Rate limit must allow at least 1 request per window")]
    InvalidRateLimit,
}
