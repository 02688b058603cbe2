pub mod detection_trace;
pub mod flipped_detector;
pub mod image_dir_sink;
pub mod stop_signals;
