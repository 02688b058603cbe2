use crate::shared::frame::Frame;

/// Consumes annotated frames, e.g. a preview window.
pub trait FrameSink: Send {
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}
