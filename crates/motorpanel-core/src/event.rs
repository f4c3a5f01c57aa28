//! Event system for the panel front end
//!
//! Provides:
//! - Event types for connection, traffic, and program run changes
//! - Event dispatcher delivering events to the single front-end subscriber

use crate::data::Progress;
use tokio::sync::mpsc;

/// Panel event types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// Connection opened
    Connected {
        /// Device path
        port: String,
        /// Baud rate the port was opened at
        baud_rate: u32,
    },
    /// Connection closed
    Disconnected,
    /// A line arrived from the controller
    LineReceived(String),
    /// A line was written to the controller
    LineSent(String),
    /// A program run started
    RunStarted {
        /// Number of lines in the program, blank and comment lines included.
        total: usize,
    },
    /// A program line was processed
    Progress(Progress),
    /// The running program was paused
    RunPaused,
    /// The paused program was resumed
    RunResumed,
    /// Every program line was processed
    RunCompleted,
    /// The run ended on operator request
    RunStopped,
    /// The run ended because a line could not be sent
    RunFailed {
        /// 1-based number of the line that failed.
        line: usize,
        /// The underlying error text.
        reason: String,
    },
}

impl PanelEvent {
    /// Whether this event ends a program run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PanelEvent::RunCompleted | PanelEvent::RunStopped | PanelEvent::RunFailed { .. }
        )
    }
}

impl std::fmt::Display for PanelEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PanelEvent::Connected { port, baud_rate } => {
                write!(f, "Connected to {} @ {} baud", port, baud_rate)
            }
            PanelEvent::Disconnected => write!(f, "Disconnected"),
            PanelEvent::LineReceived(line) => write!(f, "<<< {}", line),
            PanelEvent::LineSent(line) => write!(f, ">>> {}", line),
            PanelEvent::RunStarted { total } => write!(f, "Program started ({} lines)", total),
            PanelEvent::Progress(progress) => write!(f, "{}", progress),
            PanelEvent::RunPaused => write!(f, "Program paused"),
            PanelEvent::RunResumed => write!(f, "Program resumed"),
            PanelEvent::RunCompleted => write!(f, "Program completed"),
            PanelEvent::RunStopped => write!(f, "Program stopped"),
            PanelEvent::RunFailed { line, reason } => {
                write!(f, "Line {} could not be sent: {}", line, reason)
            }
        }
    }
}

/// Receiving half handed to the front end
pub type EventReceiver = mpsc::UnboundedReceiver<PanelEvent>;

/// Event dispatcher for publishing events to the front end
///
/// Cloned into every background thread; publishing never blocks.
#[derive(Clone, Debug, Default)]
pub struct EventDispatcher {
    tx: Option<mpsc::UnboundedSender<PanelEvent>>,
}

impl EventDispatcher {
    /// Create a dispatcher together with the receiver of its events
    pub fn channel() -> (Self, EventReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Create a dispatcher that discards every event
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Publish an event to the subscriber
    ///
    /// Returns `false` when nobody is listening any more.
    pub fn publish(&self, event: PanelEvent) -> bool {
        match &self.tx {
            Some(tx) => match tx.send(event) {
                Ok(()) => true,
                Err(e) => {
                    tracing::trace!("Event dropped, subscriber gone: {}", e.0);
                    false
                }
            },
            None => false,
        }
    }
}
