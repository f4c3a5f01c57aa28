//! # MotorPanel
//!
//! Serial control panel for a multi-axis stepper rig with one servo:
//! - Single motor and servo commands over a text protocol
//! - G-code program streaming with pause, resume, and stop
//! - Serial (USB) connectivity at 115200 baud
//!
//! ## Architecture
//!
//! MotorPanel is organized as a workspace with multiple crates:
//!
//! 1. **motorpanel-core** - Errors, events, run state, program model
//! 2. **motorpanel-communication** - Serial link, command protocol, program runner
//! 3. **motorpanel-settings** - Configuration loading and validation
//! 4. **motorpanel** - Headless front end that integrates all crates

pub mod cli;

pub use motorpanel_core::{
    ConnectionError, Error, EventDispatcher, EventReceiver, LineKind, PanelEvent, Program,
    Progress, Result, RunState,
};

pub use motorpanel_communication::{
    list_ports, select_port, send_command, Axis, ConnectionParams, Direction, LineSink,
    MotorCommand, ProgramRunner, RunnerConfig, SerialLink, SerialPortInfo,
};

pub use motorpanel_settings::Config;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging with:
/// - Console output with pretty formatting
/// - RUST_LOG environment variable support
/// - Thread names, so listener and runner lines are told apart
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_thread_names(true)
        .with_line_number(true)
        .pretty();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
