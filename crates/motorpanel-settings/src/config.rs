//! Configuration for MotorPanel
//!
//! Provides configuration file loading and validation. JSON and TOML
//! files are accepted; any section or key left out keeps its default.
//!
//! Configuration is organized into logical sections:
//! - Connection settings (default port, baud rate, timeouts)
//! - Runner timing (settle delay, pause polling)
//! - Port list polling

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
use motorpanel_communication::{ConnectionParams, RunnerConfig, DEFAULT_BAUD_RATE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Listener polls must stay below this
const MAX_LISTENER_POLL_MS: u64 = 100;

/// Upper bound for the paused-run poll
const MAX_PAUSE_POLL_MS: u64 = 1000;

/// Connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Port to use when none is given on the command line
    pub port: Option<String>,
    /// Baud rate for serial connections
    pub baud_rate: u32,
    /// Read/write timeout in milliseconds
    pub timeout_ms: u64,
    /// Background listener poll interval in milliseconds
    pub listener_poll_ms: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: 1000,
            listener_poll_ms: 20,
        }
    }
}

/// Program runner timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Pause after each transmitted line in milliseconds
    pub settle_delay_ms: u64,
    /// Poll interval while paused in milliseconds
    pub pause_poll_ms: u64,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 50,
            pause_poll_ms: 100,
        }
    }
}

/// Port list polling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortSettings {
    /// Interval between port list refreshes in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
        }
    }
}

impl PortSettings {
    /// Interval between port list refreshes
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Connection settings
    pub connection: ConnectionSettings,
    /// Runner timing
    pub runner: RunnerSettings,
    /// Port list polling
    pub ports: PortSettings,
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location: `<config dir>/motorpanel/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("motorpanel").join("config.toml"))
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no configuration directory on this platform".into())
            })
    }

    /// Load the config at the default location, or defaults if there is none
    pub fn load_or_default() -> SettingsResult<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from_file(&path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::LoadError {
            path: path.display().to_string(),
            source,
        })?;

        let config: Self = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&content)?,
            Some("toml") => toml::from_str(&content)?,
            other => {
                return Err(ConfigError::UnsupportedFormat(
                    other.unwrap_or_default().to_string(),
                )
                .into())
            }
        };

        config.validate()?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.connection.baud_rate == 0 {
            return Err(out_of_range("connection.baud_rate", 0, "must be > 0"));
        }

        if self.connection.timeout_ms == 0 {
            return Err(out_of_range("connection.timeout_ms", 0, "must be > 0"));
        }

        let listener_poll = self.connection.listener_poll_ms;
        if listener_poll == 0 || listener_poll >= MAX_LISTENER_POLL_MS {
            return Err(out_of_range(
                "connection.listener_poll_ms",
                listener_poll,
                &format!("must be between 1 and {}", MAX_LISTENER_POLL_MS - 1),
            ));
        }

        let pause_poll = self.runner.pause_poll_ms;
        if pause_poll == 0 || pause_poll > MAX_PAUSE_POLL_MS {
            return Err(out_of_range(
                "runner.pause_poll_ms",
                pause_poll,
                &format!("must be between 1 and {}", MAX_PAUSE_POLL_MS),
            ));
        }

        if self.ports.poll_interval_ms == 0 {
            return Err(out_of_range("ports.poll_interval_ms", 0, "must be > 0"));
        }

        Ok(())
    }

    /// Serial parameters for the link
    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams {
            baud_rate: self.connection.baud_rate,
            timeout_ms: self.connection.timeout_ms,
            listener_poll_ms: self.connection.listener_poll_ms,
        }
    }

    /// Timing for the program runner
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            settle_delay: Duration::from_millis(self.runner.settle_delay_ms),
            pause_poll: Duration::from_millis(self.runner.pause_poll_ms),
        }
    }
}

fn out_of_range(key: &str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::ValueOutOfRange {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
