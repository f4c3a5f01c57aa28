//! Error types for the settings crate.
//!
//! Configuration is only ever read, so the errors cover locating,
//! parsing, and validating a configuration file.

use std::io;
use thiserror::Error;

/// Errors that can occur while loading settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The configuration file could not be loaded.
    #[error("Failed to load settings from {path}: {source}")]
    LoadError {
        /// Path of the file.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The configuration directory could not be determined.
    #[error("Config directory error: {0}")]
    ConfigDirectory(String),

    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A configuration validation error occurred.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors related to configuration validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration file format is not supported.
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// A configuration value is out of valid range.
    #[error("Value out of range for '{key}': {value} ({reason})")]
    ValueOutOfRange {
        /// Dotted key of the setting.
        key: String,
        /// The rejected value.
        value: String,
        /// The accepted range.
        reason: String,
    },
}

/// Result type alias for settings operations.
pub type SettingsResult<T> = Result<T, SettingsError>;

/// Result type alias for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::UnsupportedFormat("yaml".to_string());
        assert_eq!(err.to_string(), "Unsupported config format: yaml");

        let err = ConfigError::ValueOutOfRange {
            key: "connection.baud_rate".to_string(),
            value: "0".to_string(),
            reason: "must be > 0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Value out of range for 'connection.baud_rate': 0 (must be > 0)"
        );
    }

    #[test]
    fn test_error_conversion() {
        let config_err = ConfigError::UnsupportedFormat("ini".to_string());
        let settings_err: SettingsError = config_err.into();
        assert!(matches!(settings_err, SettingsError::Config(_)));
    }
}
