pub mod actuator;
pub mod gimbal;
pub mod light_align;
pub mod multi_responder;
pub mod tracking_responder;
