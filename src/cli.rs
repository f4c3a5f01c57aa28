//! Headless front end
//!
//! Drives the panel core from the command line: list ports, issue single
//! motor and servo commands, or stream a program file while printing the
//! controller's replies and the run's progress.

use crate::{
    list_ports, select_port, send_command, Axis, Config, Direction, EventDispatcher,
    EventReceiver, MotorCommand, PanelEvent, Program, ProgramRunner, SerialLink,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How long single commands wait for controller replies before exiting
const REPLY_WINDOW: Duration = Duration::from_millis(500);

/// Command-line arguments
#[derive(Debug, Parser)]
#[command(
    name = "motorpanel",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_DATE"), ")"),
    about = "Serial control panel for a stepper rig"
)]
pub struct Cli {
    /// Configuration file (.toml or .json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Panel operations
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List attached serial ports
    Ports {
        /// Keep polling and print the list whenever it changes
        #[arg(long)]
        watch: bool,
    },
    /// Move one axis
    Jog {
        /// Serial device; defaults to the configured or first listed port
        #[arg(long)]
        port: Option<String>,
        /// Axis letter (X, Y, Z, E, R, T)
        #[arg(long)]
        axis: String,
        /// forward or backward
        #[arg(long, default_value = "forward")]
        direction: String,
        /// Microseconds per step
        #[arg(long)]
        speed: String,
        /// Step count; omit or 0 to move until halted
        #[arg(long, default_value = "")]
        steps: String,
    },
    /// Stop one axis
    Halt {
        /// Serial device; defaults to the configured or first listed port
        #[arg(long)]
        port: Option<String>,
        /// Axis letter (X, Y, Z, E, R, T)
        #[arg(long)]
        axis: String,
    },
    /// Set the servo angle
    Servo {
        /// Serial device; defaults to the configured or first listed port
        #[arg(long)]
        port: Option<String>,
        /// Angle in degrees, 0 to 180
        #[arg(long, allow_hyphen_values = true)]
        angle: String,
    },
    /// Stream a G-code program
    Run {
        /// Serial device; defaults to the configured or first listed port
        #[arg(long)]
        port: Option<String>,
        /// Program file (.gcode, .nc, .txt)
        file: PathBuf,
    },
}

/// Execute the parsed command line
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::load_or_default().context("loading default config")?,
    };

    match cli.command {
        Command::Ports { watch } => show_ports(&config, watch),
        Command::Jog {
            port,
            axis,
            direction,
            speed,
            steps,
        } => {
            let axis: Axis = axis.parse()?;
            let direction: Direction = direction.parse()?;
            let command = MotorCommand::jog(axis, direction, &speed, &steps)?;
            single_command(&config, port, &command)
        }
        Command::Halt { port, axis } => {
            let command = MotorCommand::stop(axis.parse()?);
            single_command(&config, port, &command)
        }
        Command::Servo { port, angle } => {
            let command = MotorCommand::servo(&angle)?;
            single_command(&config, port, &command)
        }
        Command::Run { port, file } => run_program(&config, port, &file),
    }
}

fn show_ports(config: &Config, watch: bool) -> anyhow::Result<()> {
    let mut last: Option<Vec<String>> = None;
    loop {
        let labels: Vec<String> = list_ports()?.iter().map(|port| port.label()).collect();
        if last.as_ref() != Some(&labels) {
            if labels.is_empty() {
                println!("No serial ports found");
            }
            for label in &labels {
                println!("{}", label);
            }
            last = Some(labels);
        }

        if !watch {
            return Ok(());
        }
        std::thread::sleep(config.ports.poll_interval());
    }
}

/// Open the link on the requested, configured, or first listed port
fn connect(
    config: &Config,
    port: Option<String>,
) -> anyhow::Result<(Arc<SerialLink>, EventDispatcher, EventReceiver)> {
    let device = match port.or_else(|| config.connection.port.clone()) {
        Some(device) => device,
        None => {
            let ports = list_ports()?;
            select_port(&ports, None)?.port_name.clone()
        }
    };

    let (events, rx) = EventDispatcher::channel();
    let link = Arc::new(SerialLink::new(config.connection_params(), events.clone()));
    link.connect(&device)
        .with_context(|| format!("connecting to {}", device))?;
    Ok((link, events, rx))
}

fn print_event(event: &PanelEvent) {
    match event {
        PanelEvent::Progress(_) | PanelEvent::LineReceived(_) | PanelEvent::LineSent(_) => {
            println!("{}", event)
        }
        other => println!("-- {}", other),
    }
}

fn single_command(
    config: &Config,
    port: Option<String>,
    command: &MotorCommand,
) -> anyhow::Result<()> {
    let (link, _events, mut rx) = connect(config, port)?;
    let sent = send_command(link.as_ref(), command);

    let deadline = Instant::now() + REPLY_WINDOW;
    while Instant::now() < deadline {
        match rx.try_recv() {
            Ok(event) => print_event(&event),
            Err(_) => std::thread::sleep(Duration::from_millis(20)),
        }
    }

    link.disconnect();
    while let Ok(event) = rx.try_recv() {
        print_event(&event);
    }
    Ok(sent?)
}

fn run_program(config: &Config, port: Option<String>, file: &Path) -> anyhow::Result<()> {
    let program =
        Program::load(file).with_context(|| format!("loading program {}", file.display()))?;
    println!(
        "Loaded {} ({} lines, {} commands)",
        file.display(),
        program.loaded_line_count(),
        program.command_count()
    );

    let (link, events, mut rx) = connect(config, port)?;
    let runner = ProgramRunner::new(link.clone(), events, config.runner_config());
    runner.start(program)?;

    let mut outcome = Ok(());
    while let Some(event) = rx.blocking_recv() {
        print_event(&event);
        if let PanelEvent::RunFailed { line, reason } = &event {
            outcome = Err(anyhow::anyhow!("line {} could not be sent: {}", line, reason));
        }
        if event.is_terminal() {
            break;
        }
    }

    runner.stop();
    link.disconnect();
    outcome
}
