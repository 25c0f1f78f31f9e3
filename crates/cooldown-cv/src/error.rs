//! Error types for cooldown-cv

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CvError {
    #[error(
        "template {template_width}x{template_height} does not fit in frame {frame_width}x{frame_height}"
    )]
    InvalidTemplateSize {
        template_width: u32,
        template_height: u32,
        frame_width: u32,
        frame_height: u32,
    },

    #[error("template image is empty")]
    EmptyTemplate,

    #[error("failed to load template {path:?}: {source}")]
    TemplateLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("frame capture failed: {0}")]
    Capture(String),

    #[error("frame buffer holds {actual} bytes, expected {expected} for {width}x{height}x{channels}")]
    BufferSize {
        width: u32,
        height: u32,
        channels: u8,
        expected: usize,
        actual: usize,
    },

    #[error("unsupported channel count: {0}")]
    UnsupportedChannels(u8),
}
