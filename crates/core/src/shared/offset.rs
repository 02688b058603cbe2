/// Displacement of a target's reference point from frame center, in pixels.
///
/// `dx > 0` is right of center, `dy > 0` is below center.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Offset {
    pub dx: f64,
    pub dy: f64,
}

impl Offset {
    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

impl From<(f64, f64)> for Offset {
    fn from((dx, dy): (f64, f64)) -> Self {
        Self { dx, dy }
    }
}
