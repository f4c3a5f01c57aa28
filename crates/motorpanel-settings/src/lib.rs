//! MotorPanel Settings Crate
//!
//! Loads and validates the panel's configuration. Settings are read at
//! startup and never written back.

pub mod config;
pub mod error;

pub use config::{Config, ConnectionSettings, PortSettings, RunnerSettings};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
