use crate::shared::config::{AxisConfig, ConfigError, GimbalConfig};
use crate::shared::offset::Offset;

use super::actuator::{ActuatorError, ServoOutput};
use super::tracking_responder::TrackingResponder;

/// Which way an axis moves its duty for a positive offset beyond tolerance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Polarity {
    /// Positive offset lowers duty (horizontal: target right => pan right).
    Inverted,
    /// Positive offset raises duty (vertical: target below => tilt down).
    Direct,
}

/// Next duty for one axis: a fixed step toward the target once the offset
/// leaves the tolerance band, always clamped to `[min, max]`.
fn step_duty(current: u32, offset: f64, axis: &AxisConfig, polarity: Polarity) -> u32 {
    let raise = match polarity {
        Polarity::Inverted => offset < -axis.tolerance,
        Polarity::Direct => offset > axis.tolerance,
    };
    let lower = match polarity {
        Polarity::Inverted => offset > axis.tolerance,
        Polarity::Direct => offset < -axis.tolerance,
    };
    let next = if raise {
        current.saturating_add(axis.step)
    } else if lower {
        current.saturating_sub(axis.step)
    } else {
        current
    };
    next.clamp(axis.min, axis.max)
}

/// Pan/tilt head that nudges toward the target a fixed step per frame.
///
/// On target loss it holds its last position; it never recenters on its own.
pub struct Gimbal {
    horizontal: Box<dyn ServoOutput>,
    vertical: Box<dyn ServoOutput>,
    config: GimbalConfig,
    horizontal_duty: u32,
    vertical_duty: u32,
}

impl Gimbal {
    /// Validates `config` and commits the start duties to both servos.
    pub fn new(
        horizontal: Box<dyn ServoOutput>,
        vertical: Box<dyn ServoOutput>,
        config: GimbalConfig,
    ) -> Result<Self, GimbalError> {
        config.validate()?;
        let mut gimbal = Self {
            horizontal,
            vertical,
            config,
            horizontal_duty: config.horizontal.start,
            vertical_duty: config.vertical.start,
        };
        gimbal.commit()?;
        Ok(gimbal)
    }

    pub fn horizontal_duty(&self) -> u32 {
        self.horizontal_duty
    }

    pub fn vertical_duty(&self) -> u32 {
        self.vertical_duty
    }

    fn commit(&mut self) -> Result<(), ActuatorError> {
        log::trace!(
            "Gimbal duty: horizontal={}us vertical={}us",
            self.horizontal_duty,
            self.vertical_duty
        );
        // Both axes are written even if the first fails; the first error wins.
        let horizontal = self.horizontal.set_pulse_width(self.horizontal_duty);
        let vertical = self.vertical.set_pulse_width(self.vertical_duty);
        horizontal.and(vertical)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GimbalError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Actuator(#[from] ActuatorError),
}

impl TrackingResponder for Gimbal {
    fn name(&self) -> &str {
        "gimbal"
    }

    fn found_object(&mut self, offset: Offset) -> Result<(), ActuatorError> {
        self.horizontal_duty = step_duty(
            self.horizontal_duty,
            offset.dx,
            &self.config.horizontal,
            Polarity::Inverted,
        );
        self.vertical_duty = step_duty(
            self.vertical_duty,
            offset.dy,
            &self.config.vertical,
            Polarity::Direct,
        );
        self.commit()
    }

    fn no_object(&mut self) -> Result<(), ActuatorError> {
        Ok(())
    }
}
