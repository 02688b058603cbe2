use crate::shared::offset::Offset;

use super::actuator::ActuatorError;

/// Reacts to where the primary target sits, once per frame.
///
/// Exactly one of the two methods is called per frame. Implementations own
/// their actuation state and must stay bounded in time, since they run inside
/// the capture loop. Hardware failures are returned, never retried here.
pub trait TrackingResponder: Send {
    /// Short label used in logs and error reports.
    fn name(&self) -> &str;

    fn found_object(&mut self, offset: Offset) -> Result<(), ActuatorError>;

    /// Brings actuation to the responder's idle state.
    fn no_object(&mut self) -> Result<(), ActuatorError>;
}
