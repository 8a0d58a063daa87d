//! Configuration error types

use thiserror::Error;

/// Errors raised while loading, validating or saving a [`super::Config`]
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file: {0}")]
    FileReadError(String),

    #[error("Cannot write configuration file: {0}")]
    FileWriteError(String),

    #[error("Malformed configuration: {0}")]
    ParseError(String),

    #[error("Cannot serialize configuration: {0}")]
    SerializeError(String),

    /// An environment variable held an unparsable value
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}
