//! Grayscale conversions for templates and captured frames

use crate::error::CvError;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma, Rgb, Rgba};
use std::path::Path;

/// A captured frame as a packed byte buffer, 1, 3 or 4 channels per pixel
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub data: Vec<u8>,
}

/// Image utility functions
pub struct ImageUtils;

impl ImageUtils {
    /// Load an image file as grayscale
    pub fn load_grayscale<P: AsRef<Path>>(path: P) -> Result<GrayImage, CvError> {
        let path = path.as_ref();
        let image = image::open(path).map_err(|source| CvError::TemplateLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(image.to_luma8())
    }

    /// Convert any decoded image to grayscale
    pub fn to_grayscale(image: &DynamicImage) -> GrayImage {
        image.to_luma8()
    }

    /// Convert a raw capture buffer to grayscale, checking its layout first
    pub fn from_raw(frame: RawFrame) -> Result<GrayImage, CvError> {
        let RawFrame {
            width,
            height,
            channels,
            data,
        } = frame;

        if !matches!(channels, 1 | 3 | 4) {
            return Err(CvError::UnsupportedChannels(channels));
        }

        let expected = width as usize * height as usize * channels as usize;
        let actual = data.len();
        let size_error = || CvError::BufferSize {
            width,
            height,
            channels,
            expected,
            actual,
        };
        if actual != expected {
            return Err(size_error());
        }

        let image = match channels {
            1 => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
            3 => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
            _ => ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
        };

        image.map(|img| img.to_luma8()).ok_or_else(size_error)
    }
}
