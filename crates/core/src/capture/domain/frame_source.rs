use crate::shared::frame::Frame;

/// Supplies camera frames in capture order.
///
/// `Ok(None)` means the source is exhausted and the session should end.
pub trait FrameSource: Send {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>>;
}
