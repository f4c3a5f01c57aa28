//! Program runner
//!
//! Streams a G-code program to the controller one line at a time on a
//! dedicated thread. There is no acknowledgment from the firmware; a
//! fixed settle delay after every transmitted line throttles the stream.
//!
//! Run lifecycle: `Idle -> Running -> {Paused <-> Running} ->
//! {Completed | Stopped | Failed}`. Every call to [`ProgramRunner::start`]
//! gets fresh control state, so a finished run never leaks its flags
//! into the next one.

use crate::communication::LineSink;
use motorpanel_core::{
    Error, EventDispatcher, LineKind, PanelEvent, Program, Progress, Result, RunState,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Timing configuration for program runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Pause after each transmitted line
    pub settle_delay: Duration,
    /// Poll interval while paused; also bounds how long a stop takes
    pub pause_poll: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(50),
            pause_poll: Duration::from_millis(100),
        }
    }
}

/// Flags shared between the runner handle and its worker thread
#[derive(Debug)]
struct RunControl {
    stop: AtomicBool,
    paused: AtomicBool,
    state: Mutex<RunState>,
}

impl RunControl {
    fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            state: Mutex::new(RunState::Running),
        }
    }

    fn state(&self) -> RunState {
        self.state.lock().clone()
    }

    fn finish(&self, state: RunState) {
        *self.state.lock() = state;
    }

    fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Block while paused; `false` means a stop was requested
    fn wait_while_paused(&self, poll: Duration) -> bool {
        loop {
            if self.stop_requested() {
                return false;
            }
            if !self.paused.load(Ordering::SeqCst) {
                return true;
            }
            thread::sleep(poll);
        }
    }
}

struct ActiveRun {
    control: Arc<RunControl>,
    worker: Option<JoinHandle<()>>,
}

impl ActiveRun {
    fn join(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::error!("Program runner thread panicked");
            }
        }
    }
}

/// Drives program runs over a line sink
pub struct ProgramRunner {
    sink: Arc<dyn LineSink>,
    events: EventDispatcher,
    config: RunnerConfig,
    current: Mutex<Option<ActiveRun>>,
}

impl ProgramRunner {
    /// Create a runner that sends through `sink`
    pub fn new(sink: Arc<dyn LineSink>, events: EventDispatcher, config: RunnerConfig) -> Self {
        Self {
            sink,
            events,
            config,
            current: Mutex::new(None),
        }
    }

    /// Start running `program`
    ///
    /// Rejected while a previous run is still running or paused, when the
    /// sink is not connected, or when the program has no non-blank line.
    pub fn start(&self, program: Program) -> Result<()> {
        let mut current = self.current.lock();

        if let Some(run) = current.as_ref() {
            if run.control.state().is_active() {
                tracing::warn!("Program start rejected: a run is already active");
                return Err(Error::AlreadyRunning);
            }
        }
        if !self.sink.is_connected() {
            return Err(Error::NotConnected);
        }
        if program.is_blank() {
            return Err(Error::invalid_input(
                "program",
                "",
                "no G-code lines to run",
            ));
        }

        if let Some(mut previous) = current.take() {
            previous.join();
        }

        let control = Arc::new(RunControl::new());
        let worker = {
            let control = control.clone();
            let sink = self.sink.clone();
            let events = self.events.clone();
            let config = self.config;
            thread::Builder::new()
                .name("program-runner".to_string())
                .spawn(move || execute(program, sink.as_ref(), &control, &events, config))?
        };

        *current = Some(ActiveRun {
            control,
            worker: Some(worker),
        });
        Ok(())
    }

    /// Suspend transmission after the line in flight
    pub fn pause(&self) {
        let current = self.current.lock();
        let Some(run) = current.as_ref() else {
            return;
        };

        let mut state = run.control.state.lock();
        if *state == RunState::Running {
            run.control.paused.store(true, Ordering::SeqCst);
            *state = RunState::Paused;
            tracing::info!("Program paused");
            self.events.publish(PanelEvent::RunPaused);
        }
    }

    /// Continue a paused run where it left off
    pub fn resume(&self) {
        let current = self.current.lock();
        let Some(run) = current.as_ref() else {
            return;
        };

        let mut state = run.control.state.lock();
        if *state == RunState::Paused {
            run.control.paused.store(false, Ordering::SeqCst);
            *state = RunState::Running;
            tracing::info!("Program resumed");
            self.events.publish(PanelEvent::RunResumed);
        }
    }

    /// Pause a running program or resume a paused one
    pub fn toggle_pause(&self) {
        match self.state() {
            RunState::Running => self.pause(),
            RunState::Paused => self.resume(),
            _ => {}
        }
    }

    /// Stop the current run and wait for its thread to exit
    pub fn stop(&self) {
        let handle = {
            let mut current = self.current.lock();
            let Some(run) = current.as_mut() else {
                return;
            };
            run.control.stop.store(true, Ordering::SeqCst);
            run.worker.take()
        };

        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("Program runner thread panicked");
            }
        }
    }

    /// State of the current (or last) run
    pub fn state(&self) -> RunState {
        self.current
            .lock()
            .as_ref()
            .map(|run| run.control.state())
            .unwrap_or_default()
    }

    /// Whether a run is running or paused
    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }
}

impl Drop for ProgramRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker thread body: process every line in order
fn execute(
    program: Program,
    sink: &dyn LineSink,
    control: &RunControl,
    events: &EventDispatcher,
    config: RunnerConfig,
) {
    let total = program.len();
    tracing::info!("Program started ({} lines)", total);
    events.publish(PanelEvent::RunStarted { total });

    for (index, raw) in program.lines().iter().enumerate() {
        let number = index + 1;

        if !control.wait_while_paused(config.pause_poll) {
            tracing::info!("Program stopped before line {}", number);
            control.finish(RunState::Stopped);
            events.publish(PanelEvent::RunStopped);
            return;
        }

        if let Some(command) = LineKind::classify(raw).command() {
            if let Err(e) = sink.send_line(command) {
                let reason = match e {
                    Error::Write { reason, .. } => reason,
                    other => other.to_string(),
                };
                tracing::error!("Program failed at line {}: {}", number, reason);
                control.finish(RunState::Failed {
                    line: number,
                    reason: reason.clone(),
                });
                events.publish(PanelEvent::RunFailed {
                    line: number,
                    reason,
                });
                return;
            }
            thread::sleep(config.settle_delay);
        }

        events.publish(PanelEvent::Progress(Progress::new(number, total)));
    }

    tracing::info!("Program completed");
    control.finish(RunState::Completed);
    events.publish(PanelEvent::RunCompleted);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing() {
        let config = RunnerConfig::default();
        assert_eq!(config.settle_delay, Duration::from_millis(50));
        assert_eq!(config.pause_poll, Duration::from_millis(100));
    }

    #[test]
    fn test_wait_while_paused_observes_stop() {
        let control = RunControl::new();
        control.paused.store(true, Ordering::SeqCst);
        control.stop.store(true, Ordering::SeqCst);
        assert!(!control.wait_while_paused(Duration::from_millis(1)));
    }

    #[test]
    fn test_wait_while_paused_returns_when_running() {
        let control = RunControl::new();
        assert!(control.wait_while_paused(Duration::from_millis(1)));
    }
}
