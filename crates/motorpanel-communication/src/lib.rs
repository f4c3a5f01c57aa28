//! # MotorPanel Communication
//!
//! Serial link management, the stepper board command protocol, and the
//! program runner that streams G-code over the link.

pub mod communication;
pub mod firmware;

pub use communication::{
    list_ports, select_port, send_sequence, ConnectionParams, LineSink, NativePortOpener,
    PortOpener, ProgramRunner, RealSerialPort, RunnerConfig, SerialLink, SerialPort,
    SerialPortInfo, DEFAULT_BAUD_RATE,
};

pub use firmware::{send_command, Axis, Direction, MotorCommand};
