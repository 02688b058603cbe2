use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{
    CENTER_SIZE_PX, CENTER_TOLERANCE_X, CENTER_TOLERANCE_Y, FRAME_MODEL_HEIGHT,
    FRAME_MODEL_WIDTH, SERVO_INCREMENT_X, SERVO_INCREMENT_Y, SERVO_MAX, SERVO_MIN,
    SERVO_START_X, SERVO_START_Y,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}

/// Model-frame dimensions used to locate the frame center.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameGeometry {
    pub width: u32,
    pub height: u32,
}

impl FrameGeometry {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "Frame dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for FrameGeometry {
    fn default() -> Self {
        Self::new(FRAME_MODEL_WIDTH, FRAME_MODEL_HEIGHT)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightAlignConfig {
    /// Half-width of the center zone; `|dx| <= center_size` lights center.
    pub center_size: f64,
}

impl LightAlignConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.center_size.is_nan() || self.center_size < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "Center size must be non-negative, got {}",
                self.center_size
            )));
        }
        Ok(())
    }
}

impl Default for LightAlignConfig {
    fn default() -> Self {
        Self {
            center_size: CENTER_SIZE_PX,
        }
    }
}

/// Control parameters for one servo axis. Duty values are pulse widths in µs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisConfig {
    pub tolerance: f64,
    pub step: u32,
    pub min: u32,
    pub max: u32,
    pub start: u32,
}

impl AxisConfig {
    pub fn horizontal() -> Self {
        Self {
            tolerance: CENTER_TOLERANCE_X,
            step: SERVO_INCREMENT_X,
            min: SERVO_MIN,
            max: SERVO_MAX,
            start: SERVO_START_X,
        }
    }

    pub fn vertical() -> Self {
        Self {
            tolerance: CENTER_TOLERANCE_Y,
            step: SERVO_INCREMENT_Y,
            min: SERVO_MIN,
            max: SERVO_MAX,
            start: SERVO_START_Y,
        }
    }

    pub fn validate(&self, axis: &str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::Invalid(format!(
                "{axis} servo min {} exceeds max {}",
                self.min, self.max
            )));
        }
        if self.min < SERVO_MIN || self.max > SERVO_MAX {
            return Err(ConfigError::Invalid(format!(
                "{axis} servo bounds must lie within {SERVO_MIN}-{SERVO_MAX}us, got {}-{}",
                self.min, self.max
            )));
        }
        if !(self.min..=self.max).contains(&self.start) {
            return Err(ConfigError::Invalid(format!(
                "{axis} servo start {} outside {}-{}",
                self.start, self.min, self.max
            )));
        }
        if self.step == 0 {
            return Err(ConfigError::Invalid(format!(
                "{axis} servo step must be positive"
            )));
        }
        if self.tolerance.is_nan() || self.tolerance < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "{axis} tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        Ok(())
    }
}

/// Per-axis servo parameters. In JSON each axis may name only the fields it
/// changes; the rest keep that axis's defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "GimbalOverrides")]
pub struct GimbalConfig {
    pub horizontal: AxisConfig,
    pub vertical: AxisConfig,
}

impl GimbalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.horizontal.validate("Horizontal")?;
        self.vertical.validate("Vertical")
    }
}

impl Default for GimbalConfig {
    fn default() -> Self {
        Self {
            horizontal: AxisConfig::horizontal(),
            vertical: AxisConfig::vertical(),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct AxisOverrides {
    tolerance: Option<f64>,
    step: Option<u32>,
    min: Option<u32>,
    max: Option<u32>,
    start: Option<u32>,
}

impl AxisOverrides {
    fn apply(self, base: AxisConfig) -> AxisConfig {
        AxisConfig {
            tolerance: self.tolerance.unwrap_or(base.tolerance),
            step: self.step.unwrap_or(base.step),
            min: self.min.unwrap_or(base.min),
            max: self.max.unwrap_or(base.max),
            start: self.start.unwrap_or(base.start),
        }
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct GimbalOverrides {
    horizontal: AxisOverrides,
    vertical: AxisOverrides,
}

impl From<GimbalOverrides> for GimbalConfig {
    fn from(overrides: GimbalOverrides) -> Self {
        Self {
            horizontal: overrides.horizontal.apply(AxisConfig::horizontal()),
            vertical: overrides.vertical.apply(AxisConfig::vertical()),
        }
    }
}

/// Tunables for the selection and response loop.
///
/// Every field has a default, so a JSON file only needs the values it changes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub frame: FrameGeometry,
    pub lights: LightAlignConfig,
    pub gimbal: GimbalConfig,
}

impl TrackerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.frame.validate()?;
        self.lights.validate()?;
        self.gimbal.validate()
    }
}
