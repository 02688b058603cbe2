use crate::capture::domain::object_detector::ObjectDetector;
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Decorator for a camera mounted upside down: rotates every detection 180°
/// inside the frame so offsets are reported in the upright orientation.
pub struct FlippedDetector {
    inner: Box<dyn ObjectDetector>,
}

impl FlippedDetector {
    pub fn new(inner: Box<dyn ObjectDetector>) -> Self {
        Self { inner }
    }
}

impl ObjectDetector for FlippedDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        let boxes = self.inner.detect(frame)?;
        Ok(boxes
            .iter()
            .map(|b| b.rotated_half_turn(frame.width(), frame.height()))
            .collect())
    }
}
