use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A detection whose corners are out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid detection box ({x_min}, {y_min})-({x_max}, {y_max}): min corner exceeds max corner")]
pub struct InvalidDetection {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

/// Axis-aligned detection region in model-frame pixels.
///
/// Both corners are inclusive pixel coordinates as reported by the detector;
/// `x_min <= x_max` and `y_min <= y_max` always hold for a constructed box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "[i32; 4]", into = "[i32; 4]")]
pub struct BoundingBox {
    x_min: i32,
    y_min: i32,
    x_max: i32,
    y_max: i32,
}

impl BoundingBox {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Result<Self, InvalidDetection> {
        if x_min > x_max || y_min > y_max {
            return Err(InvalidDetection {
                x_min,
                y_min,
                x_max,
                y_max,
            });
        }
        Ok(Self {
            x_min,
            y_min,
            x_max,
            y_max,
        })
    }

    /// Builds a box from the `(x, y, width, height)` form most detectors emit.
    pub fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Result<Self, InvalidDetection> {
        Self::new(x, y, x.saturating_add(width), y.saturating_add(height))
    }

    pub fn x_min(&self) -> i32 {
        self.x_min
    }

    pub fn y_min(&self) -> i32 {
        self.y_min
    }

    pub fn x_max(&self) -> i32 {
        self.x_max
    }

    pub fn y_max(&self) -> i32 {
        self.y_max
    }

    /// Corner-to-corner distance along x.
    pub fn width(&self) -> u32 {
        self.x_max.abs_diff(self.x_min)
    }

    /// Corner-to-corner distance along y.
    pub fn height(&self) -> u32 {
        self.y_max.abs_diff(self.y_min)
    }

    /// Point used for aiming: horizontal center, upper third vertically.
    ///
    /// The upper third lands on the face when the box covers a whole person.
    pub fn reference_point(&self) -> (f64, f64) {
        let x = (self.x_min as f64 + self.x_max as f64) / 2.0;
        let y = self.y_min as f64 + (self.y_max as f64 - self.y_min as f64) / 3.0;
        (x, y)
    }

    /// Rotates the box 180° inside a `width` x `height` frame.
    ///
    /// Corners that land outside the `i32` range saturate at its bounds.
    pub fn rotated_half_turn(&self, width: u32, height: u32) -> Self {
        let w = i64::from(width);
        let h = i64::from(height);
        Self {
            x_min: saturate(w - i64::from(self.x_max)),
            y_min: saturate(h - i64::from(self.y_max)),
            x_max: saturate(w - i64::from(self.x_min)),
            y_max: saturate(h - i64::from(self.y_min)),
        }
    }
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Converts raw `[x_min, y_min, x_max, y_max]` detections, dropping malformed
/// ones with a warning.
pub fn valid_detections<I>(raw: I) -> Vec<BoundingBox>
where
    I: IntoIterator<Item = [i32; 4]>,
{
    raw.into_iter()
        .filter_map(|corners| match BoundingBox::try_from(corners) {
            Ok(b) => Some(b),
            Err(e) => {
                log::warn!("Skipping detection: {e}");
                None
            }
        })
        .collect()
}

impl TryFrom<[i32; 4]> for BoundingBox {
    type Error = InvalidDetection;

    fn try_from([x_min, y_min, x_max, y_max]: [i32; 4]) -> Result<Self, Self::Error> {
        Self::new(x_min, y_min, x_max, y_max)
    }
}

impl From<BoundingBox> for [i32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x_min, b.y_min, b.x_max, b.y_max]
    }
}
