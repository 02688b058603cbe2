pub mod box_annotator;
pub mod target_selector;
