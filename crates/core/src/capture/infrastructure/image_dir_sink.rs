use std::fs;
use std::path::{Path, PathBuf};

use crate::capture::domain::frame_sink::FrameSink;
use crate::shared::frame::Frame;

/// Writes every annotated frame to `dir` as `frame_<sequence>.png`.
pub struct ImageDirSink {
    dir: PathBuf,
}

impl ImageDirSink {
    /// Creates `dir` (and parents) if it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, sequence: usize) -> PathBuf {
        self.dir.join(format!("frame_{sequence:06}.png"))
    }
}

impl FrameSink for ImageDirSink {
    fn show(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
            .ok_or("Failed to create image from frame data")?;
        let path = self.path_for(frame.sequence());
        img.save(&path)?;
        log::debug!("Wrote {}", path.display());
        Ok(())
    }
}
