//! Stepper Command Creator
//!
//! Translates operator intents into the controller's single-character
//! text protocol. Every intent expands into a short sequence of lines
//! that must be written in order, one write per line:
//!
//! | Intent | Lines |
//! |---|---|
//! | Move forward `n` steps | `<axis>`, `v=<speed>`, `m=<n>` |
//! | Move forward continuously | `<axis>`, `v=<speed>`, `a` |
//! | Move backward `n` steps | `<axis>`, `v=<speed>`, `n=<n>` |
//! | Move backward continuously | `<axis>`, `v=<speed>`, `d` |
//! | Stop axis | `<axis>`, `w` |
//! | Servo angle | `s`, `p=<angle>` |

use motorpanel_core::{Error, Result};
use std::str::FromStr;

/// Largest servo angle in degrees
pub const MAX_SERVO_ANGLE: u8 = 180;

/// Motor axes wired to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
    /// Extruder
    E,
    /// Rotary axis
    R,
    /// Tilt axis
    T,
}

impl Axis {
    /// Every axis in panel order
    pub const ALL: [Axis; 6] = [Axis::X, Axis::Y, Axis::Z, Axis::E, Axis::R, Axis::T];

    /// Axis select command: the lowercase axis letter
    pub fn select_command(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
            Self::E => "e",
            Self::R => "r",
            Self::T => "t",
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.select_command().to_ascii_uppercase())
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "X" => Ok(Self::X),
            "Y" => Ok(Self::Y),
            "Z" => Ok(Self::Z),
            "E" => Ok(Self::E),
            "R" => Ok(Self::R),
            "T" => Ok(Self::T),
            _ => Err(Error::invalid_input(
                "axis",
                s,
                "expected one of X, Y, Z, E, R, T",
            )),
        }
    }
}

/// Direction of travel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Forward
    Forward,
    /// Backward
    Backward,
}

impl Direction {
    /// Command for a fixed number of steps, e.g. `m=200`
    fn steps_command(&self, steps: u64) -> String {
        match self {
            Self::Forward => format!("m={}", steps),
            Self::Backward => format!("n={}", steps),
        }
    }

    /// Command for moving until stopped
    fn continuous_command(&self) -> &'static str {
        match self {
            Self::Forward => "a",
            Self::Backward => "d",
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" | "fwd" | "f" | "+" => Ok(Self::Forward),
            "backward" | "back" | "b" | "-" => Ok(Self::Backward),
            _ => Err(Error::invalid_input(
                "direction",
                s,
                "expected forward or backward",
            )),
        }
    }
}

/// A validated operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MotorCommand {
    /// Move one axis
    Move {
        /// Axis to move
        axis: Axis,
        /// Direction of travel
        direction: Direction,
        /// Microseconds per step
        speed: u32,
        /// Step count; `None` moves until stopped
        steps: Option<u64>,
    },
    /// Stop one axis
    Stop {
        /// Axis to stop
        axis: Axis,
    },
    /// Set the servo angle
    Servo {
        /// Angle in degrees, 0 to 180
        angle: u8,
    },
}

impl MotorCommand {
    /// Build a move from the speed and step fields as the operator typed them
    ///
    /// The speed must be a positive integer no larger than `u32::MAX`. A
    /// step count that is empty, zero, negative or not a number means "move
    /// until stopped"; a positive count beyond `u64::MAX` is rejected.
    pub fn jog(axis: Axis, direction: Direction, speed: &str, steps: &str) -> Result<Self> {
        Ok(Self::Move {
            axis,
            direction,
            speed: parse_speed(speed)?,
            steps: parse_steps(steps)?,
        })
    }

    /// Build a stop command
    pub fn stop(axis: Axis) -> Self {
        Self::Stop { axis }
    }

    /// Build a servo command from the angle as the operator typed it
    pub fn servo(angle: &str) -> Result<Self> {
        let text = angle.trim();
        if text.is_empty() {
            return Err(Error::invalid_input("angle", angle, "enter an angle"));
        }

        let value: i64 = text
            .parse()
            .map_err(|_| Error::invalid_input("angle", angle, "not an integer"))?;

        if !(0..=MAX_SERVO_ANGLE as i64).contains(&value) {
            return Err(Error::invalid_input(
                "angle",
                angle,
                format!("must be between 0 and {}", MAX_SERVO_ANGLE),
            ));
        }

        Ok(Self::Servo { angle: value as u8 })
    }

    /// Lines to transmit, in order
    pub fn lines(&self) -> Vec<String> {
        match self {
            Self::Move {
                axis,
                direction,
                speed,
                steps,
            } => {
                let motion = match steps {
                    Some(n) => direction.steps_command(*n),
                    None => direction.continuous_command().to_string(),
                };
                vec![
                    axis.select_command().to_string(),
                    format!("v={}", speed),
                    motion,
                ]
            }
            Self::Stop { axis } => vec![axis.select_command().to_string(), "w".to_string()],
            Self::Servo { angle } => vec!["s".to_string(), format!("p={}", angle)],
        }
    }
}

fn parse_speed(speed: &str) -> Result<u32> {
    let text = speed.trim();
    let value: u32 = text.parse().map_err(|_| {
        if is_integer(text) && !text.starts_with('-') {
            Error::invalid_input("speed", speed, format!("must be at most {}", u32::MAX))
        } else {
            Error::invalid_input("speed", speed, "not a positive integer")
        }
    })?;

    if value == 0 {
        return Err(Error::invalid_input("speed", speed, "must be greater than 0"));
    }
    Ok(value)
}

fn parse_steps(steps: &str) -> Result<Option<u64>> {
    let text = steps.trim();
    if !is_integer(text) || text.starts_with('-') {
        return Ok(None);
    }

    match text.trim_start_matches('+').parse::<u64>() {
        Ok(0) => Ok(None),
        Ok(n) => Ok(Some(n)),
        Err(_) => Err(Error::invalid_input(
            "steps",
            steps,
            format!("must be at most {}", u64::MAX),
        )),
    }
}

/// Optional sign followed by at least one ASCII digit
fn is_integer(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
