use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::capture::domain::frame_source::FrameSource;
use crate::capture::domain::object_detector::ObjectDetector;
use crate::shared::bounding_box::{valid_detections, BoundingBox};
use crate::shared::config::FrameGeometry;
use crate::shared::frame::Frame;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to read trace {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("trace line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("trace line {line}: frame index {frame} is out of range")]
    FrameIndex { line: usize, frame: usize },
}

#[derive(Deserialize)]
struct TraceRecord {
    frame: usize,
    #[serde(default)]
    boxes: Vec<[i32; 4]>,
}

/// Recorded detections, one JSON object per line:
/// `{"frame": 12, "boxes": [[x_min, y_min, x_max, y_max], ...]}`.
///
/// Raw corners are kept so malformed boxes are dropped per frame at replay
/// time rather than failing the whole trace. Frames with no line have no
/// detections.
#[derive(Debug, Default)]
pub struct DetectionTrace {
    detections: HashMap<usize, Vec<[i32; 4]>>,
    frame_count: usize,
}

impl DetectionTrace {
    pub fn parse(text: &str) -> Result<Self, TraceError> {
        let mut trace = Self::default();
        for (i, line) in text.lines().enumerate() {
            let line_text = line.trim();
            if line_text.is_empty() {
                continue;
            }
            let record: TraceRecord =
                serde_json::from_str(line_text).map_err(|source| TraceError::Parse {
                    line: i + 1,
                    source,
                })?;
            let end = record
                .frame
                .checked_add(1)
                .ok_or(TraceError::FrameIndex {
                    line: i + 1,
                    frame: record.frame,
                })?;
            trace.frame_count = trace.frame_count.max(end);
            trace
                .detections
                .entry(record.frame)
                .or_default()
                .extend(record.boxes);
        }
        Ok(trace)
    }

    pub fn load(path: &Path) -> Result<Self, TraceError> {
        let text = fs::read_to_string(path).map_err(|source| TraceError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Highest recorded frame index + 1.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Splits the trace into a frame source and a detector that replays it.
    pub fn into_replay(self, geometry: FrameGeometry) -> (ReplayFrameSource, ReplayDetector) {
        let source = ReplayFrameSource::new(geometry, self.frame_count);
        let detector = ReplayDetector::new(Arc::new(self.detections));
        (source, detector)
    }
}

/// Blank frames, one per recorded frame index.
pub struct ReplayFrameSource {
    geometry: FrameGeometry,
    next: usize,
    frame_count: usize,
}

impl ReplayFrameSource {
    pub fn new(geometry: FrameGeometry, frame_count: usize) -> Self {
        Self {
            geometry,
            next: 0,
            frame_count,
        }
    }
}

impl FrameSource for ReplayFrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if self.next >= self.frame_count {
            return Ok(None);
        }
        let frame = Frame::blank(self.geometry, self.next);
        self.next += 1;
        Ok(Some(frame))
    }
}

/// Replays recorded detections by frame sequence number.
pub struct ReplayDetector {
    detections: Arc<HashMap<usize, Vec<[i32; 4]>>>,
}

impl ReplayDetector {
    pub fn new(detections: Arc<HashMap<usize, Vec<[i32; 4]>>>) -> Self {
        Self { detections }
    }
}

impl ObjectDetector for ReplayDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<BoundingBox>, Box<dyn std::error::Error>> {
        let raw = self
            .detections
            .get(&frame.sequence())
            .map(|boxes| boxes.as_slice())
            .unwrap_or_default();
        Ok(valid_detections(raw.iter().copied()))
    }
}
