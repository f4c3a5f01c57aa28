//! Firmware protocols for the boards MotorPanel drives
//!
//! Supported controllers:
//! - Stepper: multi-axis stepper board with one servo, single-character
//!   text commands

pub mod stepper;

pub use stepper::{send_command, Axis, Direction, MotorCommand};
