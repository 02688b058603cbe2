use crate::shared::config::LightAlignConfig;
use crate::shared::offset::Offset;

use super::actuator::{ActuatorError, DigitalOutput, Level};
use super::tracking_responder::TrackingResponder;

/// Which of the three lights is on. At most one ever is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightPattern {
    Off,
    Left,
    Center,
    Right,
}

impl LightPattern {
    /// Zone for a horizontal offset; the center zone includes its edges.
    pub fn for_offset(dx: f64, center_size: f64) -> Self {
        if (-center_size..=center_size).contains(&dx) {
            LightPattern::Center
        } else if dx > center_size {
            LightPattern::Right
        } else {
            LightPattern::Left
        }
    }

    /// `[left, center, right]` levels.
    pub fn levels(self) -> [Level; 3] {
        [
            Level::from_bool(self == LightPattern::Left),
            Level::from_bool(self == LightPattern::Center),
            Level::from_bool(self == LightPattern::Right),
        ]
    }

    fn banner(self) -> &'static str {
        match self {
            LightPattern::Off => "------------------",
            LightPattern::Left => "LEFT--------------",
            LightPattern::Center => "------CENTER------",
            LightPattern::Right => "-------------RIGHT",
        }
    }
}

/// Three status lights showing whether the target is left of, on, or right of
/// center. Goes dark when nothing is detected.
pub struct LightAlign {
    left: Box<dyn DigitalOutput>,
    center: Box<dyn DigitalOutput>,
    right: Box<dyn DigitalOutput>,
    config: LightAlignConfig,
    pattern: Option<LightPattern>,
}

impl LightAlign {
    pub fn new(
        left: Box<dyn DigitalOutput>,
        center: Box<dyn DigitalOutput>,
        right: Box<dyn DigitalOutput>,
        config: LightAlignConfig,
    ) -> Self {
        Self {
            left,
            center,
            right,
            config,
            pattern: None,
        }
    }

    /// Last pattern written, `None` before the first write.
    pub fn pattern(&self) -> Option<LightPattern> {
        self.pattern
    }

    /// Writes all three pins on every call. Low pins are written before the
    /// high pin; two lights are never on at once, even between writes.
    pub fn set_pattern(&mut self, pattern: LightPattern) -> Result<(), ActuatorError> {
        let levels = pattern.levels();
        let mut pins: [&mut Box<dyn DigitalOutput>; 3] =
            [&mut self.left, &mut self.center, &mut self.right];
        for (pin, level) in pins.iter_mut().zip(levels) {
            if !level.is_high() {
                pin.write(level)?;
            }
        }
        for (pin, level) in pins.iter_mut().zip(levels) {
            if level.is_high() {
                pin.write(level)?;
            }
        }
        if self.pattern != Some(pattern) {
            log::debug!("{}", pattern.banner());
        }
        self.pattern = Some(pattern);
        Ok(())
    }

    pub fn lights_off(&mut self) -> Result<(), ActuatorError> {
        self.set_pattern(LightPattern::Off)
    }
}

impl TrackingResponder for LightAlign {
    fn name(&self) -> &str {
        "lights"
    }

    fn found_object(&mut self, offset: Offset) -> Result<(), ActuatorError> {
        self.set_pattern(LightPattern::for_offset(offset.dx, self.config.center_size))
    }

    fn no_object(&mut self) -> Result<(), ActuatorError> {
        self.lights_off()
    }
}
