//! Stepper controller firmware protocol
//!
//! Single-character commands for the multi-axis stepper board with its
//! hobby servo. The firmware sends no acknowledgment, so a command counts
//! as delivered once every line has been written.

pub mod command_creator;

pub use command_creator::{Axis, Direction, MotorCommand, MAX_SERVO_ANGLE};

use crate::communication::{send_sequence, LineSink};
use motorpanel_core::{Error, Result};

/// Transmit a command's lines through `sink`
///
/// Nothing is written when the sink is disconnected. A failed line ends
/// the sequence and is named in the returned write error.
pub fn send_command<S: LineSink + ?Sized>(sink: &S, command: &MotorCommand) -> Result<()> {
    if !sink.is_connected() {
        return Err(Error::NotConnected);
    }
    tracing::debug!("Sending {:?}", command);
    send_sequence(sink, command.lines())
}
