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
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Fuzzy score must be between 0 and 100, got {0}")]
    InvalidFuzzyScore(u8),

    #[error("Maximum auto-apply matches must be at least 1")]
    InvalidMatchCap,

    #[error("Invalid {0} timeout")]
    InvalidTimeout(&'static str),

    #[error("Invalid {0} URL: {1}")]
    InvalidUrl(&'static str, String),
}
