//! Error handling for MotorPanel
//!
//! Provides the error types shared by every layer of the panel:
//! - Connection errors (opening and enumerating serial devices)
//! - Write errors (a line that could not be transmitted)
//! - Input errors (operator values rejected before anything is sent)
//! - Run errors (program runner state violations)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Connection error type
///
/// Represents errors raised while opening or enumerating serial devices.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Port not found
    #[error("Port not found: {port}")]
    PortNotFound {
        /// The name of the port that was not found.
        port: String,
    },

    /// Port is already in use
    #[error("Port already in use: {port}")]
    PortInUse {
        /// The name of the port that is in use.
        port: String,
    },

    /// The OS refused access to the port
    #[error("Access denied to port {port}")]
    AccessDenied {
        /// The name of the port that could not be accessed.
        port: String,
    },

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// Port enumeration failed
    #[error("Failed to enumerate ports: {reason}")]
    Enumeration {
        /// The reason enumeration failed.
        reason: String,
    },
}

/// Main error type for MotorPanel
#[derive(Error, Debug)]
pub enum Error {
    /// No serial device is attached
    #[error("No serial ports found")]
    PortEnumerationEmpty,

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A line could not be written to the controller
    #[error("Failed to send '{line}': {reason}")]
    Write {
        /// The line that failed to send.
        line: String,
        /// The underlying OS error.
        reason: String,
    },

    /// An operator value was rejected before transmission
    #[error("Invalid {field} '{value}': {reason}")]
    InvalidInput {
        /// The field the value was entered in.
        field: String,
        /// The rejected value as entered.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// A program run is already in progress
    #[error("A program is already running")]
    AlreadyRunning,

    /// The serial link is not connected
    #[error("Not connected")]
    NotConnected,

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Create an input error for an operator-entered value
    pub fn invalid_input(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidInput {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a write error for the given line
    pub fn write(line: impl Into<String>, reason: impl ToString) -> Self {
        Error::Write {
            line: line.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if this is a connection error
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Error::Connection(_) | Error::PortEnumerationEmpty)
    }

    /// Check if this error was raised before anything reached the wire
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::InvalidInput { .. })
    }

    /// The line that failed to send, if this is a write error
    pub fn failed_line(&self) -> Option<&str> {
        match self {
            Error::Write { line, .. } => Some(line),
            _ => None,
        }
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
