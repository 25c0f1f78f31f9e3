//! Template matching module

pub mod loader;
pub mod matcher;

pub use loader::TemplateLoader;
pub use matcher::TemplateMatcher;

use cooldown_core::TemplateId;
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// A decoded grayscale template
#[derive(Debug, Clone)]
pub struct Template {
    pub id: TemplateId,
    pub name: String,
    pub image: GrayImage,
}

impl Template {
    pub fn new(id: TemplateId, name: String, image: GrayImage) -> Self {
        Self { id, name, image }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

/// Outcome of matching one template against one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    pub matched: bool,
    /// Best similarity found, in [0, 1]
    pub confidence: f64,
    /// Top-left corner of the best match
    pub location: (u32, u32),
}

impl MatchResult {
    pub fn miss() -> Self {
        Self {
            matched: false,
            confidence: 0.0,
            location: (0, 0),
        }
    }
}

/// Template matching method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchingMethod {
    /// Correlation coefficient (mean-subtracted, robust to brightness shifts)
    CCoeffNormed,
    /// Normalized cross-correlation
    CCorrNormed,
    /// Squared difference (inverted: lower is better)
    SqDiffNormed,
}

impl MatchingMethod {
    pub fn is_inverted(&self) -> bool {
        matches!(self, MatchingMethod::SqDiffNormed)
    }
}

/// Template matching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub threshold: f64,
    pub matching_method: MatchingMethod,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            threshold: 0.8,
            matching_method: MatchingMethod::CCoeffNormed,
        }
    }
}
