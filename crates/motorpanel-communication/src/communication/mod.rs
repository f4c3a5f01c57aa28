//! Communication layer
//!
//! Serial connection management and the program runner that streams
//! lines over it.

pub mod link;
pub mod runner;
pub mod serial;

use motorpanel_core::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use link::SerialLink;
pub use runner::{ProgramRunner, RunnerConfig};
pub use serial::{
    list_ports, select_port, NativePortOpener, PortOpener, RealSerialPort, SerialPort,
    SerialPortInfo,
};

/// Baud rate the controller firmware listens at
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Serial connection parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// Baud rate
    pub baud_rate: u32,
    /// Read/write timeout in milliseconds
    pub timeout_ms: u64,
    /// Listener poll interval in milliseconds
    pub listener_poll_ms: u64,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: 1000,
            listener_poll_ms: 20,
        }
    }
}

impl ConnectionParams {
    /// Read/write timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Listener poll interval
    pub fn listener_poll(&self) -> Duration {
        Duration::from_millis(self.listener_poll_ms)
    }
}

/// Anything that can transmit newline-terminated lines to the controller
pub trait LineSink: Send + Sync {
    /// Send one line; the terminator is appended by the sink
    fn send_line(&self, line: &str) -> Result<()>;

    /// Whether a connection is currently open
    fn is_connected(&self) -> bool;
}

/// Send lines in order, one write each
///
/// Stops at the first failure; the returned write error names that line.
pub fn send_sequence<S, I>(sink: &S, lines: I) -> Result<()>
where
    S: LineSink + ?Sized,
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    for line in lines {
        sink.send_line(line.as_ref())?;
    }
    Ok(())
}
