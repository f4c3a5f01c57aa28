//! Run state and progress models

use serde::{Deserialize, Serialize};

/// State of a program run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RunState {
    /// Nothing has been started yet
    #[default]
    Idle,
    /// Lines are being transmitted
    Running,
    /// Transmission is suspended until resumed or stopped
    Paused,
    /// Ended on operator request
    Stopped,
    /// Every line was processed
    Completed,
    /// Ended because a line could not be sent
    Failed {
        /// 1-based number of the line that failed.
        line: usize,
        /// The underlying error text.
        reason: String,
    },
}

impl RunState {
    /// Running or paused
    pub fn is_active(&self) -> bool {
        matches!(self, RunState::Running | RunState::Paused)
    }

    /// Completed, stopped or failed
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Stopped | RunState::Completed | RunState::Failed { .. }
        )
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Idle => write!(f, "Idle"),
            RunState::Running => write!(f, "Running"),
            RunState::Paused => write!(f, "Paused"),
            RunState::Stopped => write!(f, "Stopped"),
            RunState::Completed => write!(f, "Completed"),
            RunState::Failed { line, reason } => write!(f, "Failed at line {}: {}", line, reason),
        }
    }
}

/// Position of a run within its program
///
/// Both counts are 1-based and include skipped blank and comment lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// Lines processed so far
    pub current: usize,
    /// Lines in the program
    pub total: usize,
}

impl Progress {
    /// Create a progress value
    pub fn new(current: usize, total: usize) -> Self {
        Self { current, total }
    }

    /// Whole percentage, rounded down
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (self.current * 100 / self.total) as u32
    }
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} lines ({}%)",
            self.current,
            self.total,
            self.percent()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_rounds_down() {
        assert_eq!(Progress::new(1, 3).percent(), 33);
        assert_eq!(Progress::new(2, 3).percent(), 66);
        assert_eq!(Progress::new(3, 3).percent(), 100);
        assert_eq!(Progress::new(0, 0).percent(), 0);
    }

    #[test]
    fn test_progress_display() {
        assert_eq!(Progress::new(5, 10).to_string(), "5/10 lines (50%)");
    }

    #[test]
    fn test_run_state_classification() {
        assert!(RunState::Running.is_active());
        assert!(RunState::Paused.is_active());
        assert!(!RunState::Idle.is_active());
        assert!(RunState::Completed.is_terminal());
        assert!(RunState::Failed {
            line: 2,
            reason: "x".to_string()
        }
        .is_terminal());
        assert!(!RunState::Idle.is_terminal());
    }
}
