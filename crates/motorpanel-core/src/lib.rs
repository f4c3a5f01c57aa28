//! # MotorPanel Core
//!
//! Core types shared by the MotorPanel crates.
//! Provides the error types, the front-end event stream, run state
//! models, and the G-code program model.

pub mod data;
pub mod error;
pub mod event;
pub mod program;

pub use data::{Progress, RunState};
pub use error::{ConnectionError, Error, Result};
pub use event::{EventDispatcher, EventReceiver, PanelEvent};
pub use program::{LineKind, Program};
