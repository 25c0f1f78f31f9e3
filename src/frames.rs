//! Frame source that replays still images from disk

use anyhow::{Context, ensure};
use cooldown_cv::utils::ImageUtils;
use cooldown_cv::{CvError, FrameSource};
use image::GrayImage;
use std::fs;
use std::path::{Path, PathBuf};

const SUPPORTED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// Cycles through the images of a directory (or a single image file),
/// handing out one per capture.
pub struct ReplaySource {
    frames: Vec<PathBuf>,
    next: usize,
}

impl ReplaySource {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut frames: Vec<PathBuf> = if path.is_dir() {
            fs::read_dir(path)
                .with_context(|| format!("Failed to read directory: {:?}", path))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| is_supported(p))
                .collect()
        } else {
            vec![path.to_path_buf()]
        };
        frames.sort();

        ensure!(!frames.is_empty(), "No frame images found in {:?}", path);
        Ok(Self { frames, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ReplaySource {
    fn capture(&mut self) -> Result<GrayImage, CvError> {
        let path = &self.frames[self.next];
        self.next = (self.next + 1) % self.frames.len();
        ImageUtils::load_grayscale(path).map_err(|e| CvError::Capture(e.to_string()))
    }
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}
