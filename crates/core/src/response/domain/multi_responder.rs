use crate::shared::offset::Offset;

use super::actuator::{ActuatorError, MemberFailure};
use super::tracking_responder::TrackingResponder;

/// Fans each event out to its members in registration order.
///
/// Every member is invoked even when an earlier one fails; all failures are
/// returned together as [`ActuatorError::Members`].
#[derive(Default)]
pub struct MultiResponder {
    members: Vec<Box<dyn TrackingResponder>>,
}

impl MultiResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, responder: Box<dyn TrackingResponder>) {
        log::debug!("Registered responder: {}", responder.name());
        self.members.push(responder);
    }

    pub fn with(mut self, responder: Box<dyn TrackingResponder>) -> Self {
        self.register(responder);
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.members.iter().map(|m| m.name()).collect()
    }

    fn dispatch<F>(&mut self, mut call: F) -> Result<(), ActuatorError>
    where
        F: FnMut(&mut dyn TrackingResponder) -> Result<(), ActuatorError>,
    {
        let mut failures = Vec::new();
        for (index, member) in self.members.iter_mut().enumerate() {
            if let Err(error) = call(member.as_mut()) {
                failures.push(MemberFailure {
                    index,
                    responder: member.name().to_string(),
                    error,
                });
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ActuatorError::Members(failures))
        }
    }
}

impl TrackingResponder for MultiResponder {
    fn name(&self) -> &str {
        "multi"
    }

    fn found_object(&mut self, offset: Offset) -> Result<(), ActuatorError> {
        self.dispatch(|member| member.found_object(offset))
    }

    fn no_object(&mut self) -> Result<(), ActuatorError> {
        self.dispatch(|member| member.no_object())
    }
}
