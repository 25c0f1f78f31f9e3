//! Cooldown Computer Vision Library
//!
//! Gated template detection over grayscale screen frames.

pub mod detection;
pub mod error;
pub mod template;
pub mod utils;

// Re-export commonly used types
pub use detection::{CooldownDetector, DetectionConfig, DetectionLoop, ScanOutcome};
pub use error::CvError;
pub use template::{MatchResult, Template, TemplateLoader, TemplateMatcher};
pub use traits::{FnFrameSource, FrameSource, TemplateMatchable};

// Error handling
pub type Result<T> = anyhow::Result<T>;

/// Core traits for the CV system
pub mod traits {
    use crate::error::CvError;
    use crate::template::MatchResult;
    use image::GrayImage;

    /// Anything that can hand out the current screen as a grayscale frame
    pub trait FrameSource: Send {
        fn capture(&mut self) -> std::result::Result<GrayImage, CvError>;
    }

    /// Wraps a capture closure as a [`FrameSource`]
    pub struct FnFrameSource<F>(pub F);

    impl<F> FrameSource for FnFrameSource<F>
    where
        F: FnMut() -> std::result::Result<GrayImage, CvError> + Send,
    {
        fn capture(&mut self) -> std::result::Result<GrayImage, CvError> {
            (self.0)()
        }
    }

    /// Trait for template matching implementations
    pub trait TemplateMatchable: Send {
        fn match_template(
            &self,
            frame: &GrayImage,
            template: &GrayImage,
            threshold: f64,
        ) -> std::result::Result<MatchResult, CvError>;
    }
}
