//! Template loading utilities

use super::Template;
use crate::error::CvError;
use crate::utils::image::ImageUtils;
use crate::Result;
use anyhow::Context;
use cooldown_core::{GateSettings, TemplateId, TemplateSettings};
use image::GrayImage;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Loads configured templates, resolving relative paths against a base directory
pub struct TemplateLoader {
    base_dir: Option<PathBuf>,
}

impl TemplateLoader {
    /// Create new template loader
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    /// Resolve relative template paths against `dir`
    pub fn with_base_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.base_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Load one image as a grayscale template, rejecting empty images
    pub fn load_image(&self, path: &Path) -> std::result::Result<GrayImage, CvError> {
        let image = ImageUtils::load_grayscale(self.resolve(path))?;
        if image.width() == 0 || image.height() == 0 {
            return Err(CvError::EmptyTemplate);
        }
        Ok(image)
    }

    /// Load the gate template. Without it nothing can be detected, so failure is fatal.
    pub fn load_gate(&self, gate: &GateSettings) -> Result<Template> {
        let image = self
            .load_image(&gate.path)
            .with_context(|| format!("Failed to load gate template: {:?}", gate.path))?;
        Ok(Template::new(TemplateId::from_path(&gate.path), "gate".to_string(), image))
    }

    /// Load cooldown templates in configuration order.
    ///
    /// A template that cannot be loaded is logged and left out; the rest are
    /// still returned.
    pub fn load_cooldowns(&self, templates: &[TemplateSettings]) -> Vec<Template> {
        #[cfg(feature = "parallel")]
        let loaded: Vec<Option<Template>> = {
            use rayon::prelude::*;
            templates.par_iter().map(|t| self.load_cooldown(t)).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let loaded: Vec<Option<Template>> = templates.iter().map(|t| self.load_cooldown(t)).collect();

        let loaded: Vec<Template> = loaded.into_iter().flatten().collect();
        info!(
            loaded = loaded.len(),
            configured = templates.len(),
            "cooldown templates loaded"
        );
        loaded
    }

    fn load_cooldown(&self, settings: &TemplateSettings) -> Option<Template> {
        match self.load_image(&settings.path) {
            Ok(image) => Some(Template::new(settings.id(), settings.name.clone(), image)),
            Err(e) => {
                warn!(template = %settings.id(), error = %e, "skipping template");
                None
            }
        }
    }
}

impl Default for TemplateLoader {
    fn default() -> Self {
        Self::new()
    }
}
