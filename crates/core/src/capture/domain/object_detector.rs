use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

/// Finds faces or people in a frame, in model-frame coordinates.
///
/// Implementations drop malformed boxes themselves (see
/// [`valid_detections`](crate::shared::bounding_box::valid_detections)).
pub trait ObjectDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>>;
}
