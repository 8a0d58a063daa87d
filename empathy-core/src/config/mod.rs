//! Configuration management for Empathy
//!
//! Environment-based configuration with defaults, TOML files and
//! validation.

use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Main library configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Group synchronizer configuration
    pub group: GroupConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Group synchronizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Number of events buffered per subscriber before it lags
    ///
    /// Bootstrap emits one event per contact in the room before `Ready`, so
    /// a subscriber that only reads after `initialize()` needs at least the
    /// room size.
    pub event_capacity: usize,

    /// How many times the initial membership fetch is attempted
    pub bootstrap_attempts: u32,

    /// Delay between two bootstrap attempts
    #[serde(with = "humantime_serde")]
    pub bootstrap_retry_delay: Duration,

    /// Keep `MembersChanged` batches received during bootstrap and apply
    /// them after the initial snapshot instead of dropping them
    pub buffer_during_bootstrap: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Enable JSON formatting
    pub json_format: bool,

    /// Include timestamps
    pub with_timestamp: bool,

    /// Include target module
    pub with_target: bool,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            event_capacity: 256,
            bootstrap_attempts: 3,
            bootstrap_retry_delay: Duration::from_millis(500),
            buffer_during_bootstrap: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            with_timestamp: true,
            with_target: true,
        }
    }
}

impl GroupConfig {
    /// Validate group settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.event_capacity == 0 {
            return Err(ConfigError::ValidationFailed(
                "event_capacity must be greater than 0".to_string(),
            ));
        }

        if self.bootstrap_attempts == 0 {
            return Err(ConfigError::ValidationFailed(
                "bootstrap_attempts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables follow the pattern: EMPATHY_<SECTION>_<KEY>
    /// Example: EMPATHY_GROUP_BOOTSTRAP_ATTEMPTS=5
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Group config
        if let Ok(capacity) = env::var("EMPATHY_GROUP_EVENT_CAPACITY") {
            config.group.event_capacity = capacity
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid event capacity: {}", e)))?;
        }
        if let Ok(attempts) = env::var("EMPATHY_GROUP_BOOTSTRAP_ATTEMPTS") {
            config.group.bootstrap_attempts = attempts.parse().map_err(|e| {
                ConfigError::InvalidValue(format!("Invalid bootstrap attempts: {}", e))
            })?;
        }
        if let Ok(delay) = env::var("EMPATHY_GROUP_BOOTSTRAP_RETRY_DELAY") {
            config.group.bootstrap_retry_delay =
                humantime_serde::re::humantime::parse_duration(&delay).map_err(|e| {
                    ConfigError::InvalidValue(format!("Invalid retry delay: {}", e))
                })?;
        }
        if let Ok(buffer) = env::var("EMPATHY_GROUP_BUFFER_DURING_BOOTSTRAP") {
            config.group.buffer_during_bootstrap = buffer
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid buffer flag: {}", e)))?;
        }

        // Logging config
        if let Ok(level) = env::var("EMPATHY_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = env::var("EMPATHY_LOG_JSON") {
            config.logging.json_format = json
                .parse()
                .map_err(|e| ConfigError::InvalidValue(format!("Invalid JSON flag: {}", e)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::FileReadError(e.to_string()))?;

        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.group.validate()?;

        if LogLevel::parse(&self.logging.level).is_none() {
            return Err(ConfigError::ValidationFailed(format!(
                "Invalid log level: {}",
                self.logging.level
            )));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), ConfigError> {
        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, contents).map_err(|e| ConfigError::FileWriteError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.group.buffer_during_bootstrap);
        assert_eq!(config.group.bootstrap_attempts, 3);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.group.event_capacity = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.group.bootstrap_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_level_validation() {
        let mut config = Config::default();

        config.logging.level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.logging.level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [group]
            bootstrap_attempts = 5
            bootstrap_retry_delay = "2s"
            "#,
        )
        .unwrap();

        assert_eq!(config.group.bootstrap_attempts, 5);
        assert_eq!(config.group.bootstrap_retry_delay, Duration::from_secs(2));
        assert_eq!(config.group.event_capacity, 256);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empathy.toml");

        let mut config = Config::default();
        config.group.buffer_during_bootstrap = false;
        config.logging.level = "debug".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert!(!loaded.group.buffer_during_bootstrap);
        assert_eq!(loaded.logging.level, "debug");
        assert_eq!(loaded.group.bootstrap_retry_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("/nonexistent/empathy.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError(_)));
    }
}
