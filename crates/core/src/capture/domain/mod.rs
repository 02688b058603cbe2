pub mod frame_sink;
pub mod frame_source;
pub mod object_detector;
pub mod stop_signal;
