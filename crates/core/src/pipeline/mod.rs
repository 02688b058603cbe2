pub mod track_targets_use_case;
pub mod tracking_logger;
