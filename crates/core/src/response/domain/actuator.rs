use std::fmt;

use thiserror::Error;

use crate::shared::constants::{SERVO_MAX, SERVO_MIN};

/// Logic level of a binary pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn from_bool(on: bool) -> Self {
        if on {
            Level::High
        } else {
            Level::Low
        }
    }

    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Low => write!(f, "LOW"),
            Level::High => write!(f, "HIGH"),
        }
    }
}

/// One member of a multi-responder that failed during a dispatch.
#[derive(Debug)]
pub struct MemberFailure {
    pub index: usize,
    pub responder: String,
    pub error: ActuatorError,
}

impl fmt::Display for MemberFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}: {}", self.index, self.responder, self.error)
    }
}

#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("write to {target} failed: {source}")]
    Io {
        target: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{target} rejected command: {reason}")]
    Rejected { target: String, reason: String },
    #[error("{} responder(s) failed: {}", .0.len(), join_failures(.0))]
    Members(Vec<MemberFailure>),
}

fn join_failures(failures: &[MemberFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Binary output pin (an LED, a relay).
///
/// Writes are fire-and-forget: no acknowledgment beyond the `Result`.
pub trait DigitalOutput: Send {
    fn write(&mut self, level: Level) -> Result<(), ActuatorError>;
}

/// Binary input pin (a push button).
pub trait DigitalInput: Send {
    fn read(&mut self) -> Result<Level, ActuatorError>;
}

/// Hobby-servo channel driven by pulse width in microseconds.
pub trait ServoOutput: Send {
    fn set_pulse_width(&mut self, micros: u32) -> Result<(), ActuatorError>;
}

/// Rejects widths outside the range hobby servos accept.
pub fn check_pulse_width(target: &str, micros: u32) -> Result<(), ActuatorError> {
    if !(SERVO_MIN..=SERVO_MAX).contains(&micros) {
        return Err(ActuatorError::Rejected {
            target: target.to_string(),
            reason: format!("pulse width {micros}us outside {SERVO_MIN}-{SERVO_MAX}us"),
        });
    }
    Ok(())
}
