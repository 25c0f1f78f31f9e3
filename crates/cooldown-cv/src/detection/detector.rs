//! Gated cooldown detection over a single frame

use super::config::DetectionConfig;
use crate::error::CvError;
use crate::template::{MatchResult, Template, TemplateLoader, TemplateMatcher};
use crate::traits::TemplateMatchable;
use crate::Result;
use cooldown_core::{DetectionEvent, EventSink, RecognitionEvent, Settings, TemplateId};
use image::GrayImage;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, trace, warn};

/// What one detection pass saw
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub gate: MatchResult,
    /// Cooldown templates recognized this pass, in configuration order
    pub recognized: Vec<TemplateId>,
}

impl ScanOutcome {
    pub fn gated(&self) -> bool {
        self.gate.matched
    }
}

/// Gate template plus the cooldown templates it guards
pub struct CooldownDetector<M: TemplateMatchable = TemplateMatcher> {
    config: DetectionConfig,
    matcher: M,
    gate: Template,
    templates: Vec<Template>,
    /// Templates already reported as not fitting the frame
    misfits: HashSet<TemplateId>,
}

impl CooldownDetector<TemplateMatcher> {
    pub fn new(config: DetectionConfig, gate: Template, templates: Vec<Template>) -> Self {
        let matcher = TemplateMatcher::new(config.template_config.clone());
        Self::with_matcher(config, matcher, gate, templates)
    }

    /// Build a detector from settings, loading every template image.
    ///
    /// Relative template paths resolve against `base_dir` when given.
    pub fn load(settings: &Settings, base_dir: Option<&Path>) -> Result<Self> {
        let mut loader = TemplateLoader::new();
        if let Some(dir) = base_dir {
            loader = loader.with_base_dir(dir);
        }

        let gate = loader.load_gate(&settings.gate)?;
        let templates = loader.load_cooldowns(&settings.templates);
        Ok(Self::new(DetectionConfig::from_settings(settings), gate, templates))
    }
}

impl<M: TemplateMatchable> CooldownDetector<M> {
    pub fn with_matcher(config: DetectionConfig, matcher: M, gate: Template, templates: Vec<Template>) -> Self {
        Self {
            config,
            matcher,
            gate,
            templates,
            misfits: HashSet::new(),
        }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn gate_id(&self) -> &TemplateId {
        &self.gate.id
    }

    pub fn template_ids(&self) -> impl Iterator<Item = &TemplateId> {
        self.templates.iter().map(|t| &t.id)
    }

    /// Run one detection pass.
    ///
    /// Cooldown templates are only checked when the gate matches this frame.
    /// Each recognition is published as soon as it is found.
    pub fn scan(&mut self, frame: &GrayImage, sink: &dyn EventSink<DetectionEvent>) -> ScanOutcome {
        let gate = check(
            &self.matcher,
            &mut self.misfits,
            frame,
            &self.gate,
            self.config.gate_threshold,
        );
        if !gate.matched {
            trace!(confidence = gate.confidence, "gate not matched");
            return ScanOutcome {
                gate,
                recognized: Vec::new(),
            };
        }

        let threshold = self.config.template_config.threshold;
        let mut recognized = Vec::new();
        for template in &self.templates {
            let result = check(&self.matcher, &mut self.misfits, frame, template, threshold);
            if result.matched {
                debug!(template = %template.id, confidence = result.confidence, "template recognized");
                sink.publish(DetectionEvent::Recognized(RecognitionEvent::now(template.id.clone())));
                recognized.push(template.id.clone());
            }
        }

        ScanOutcome { gate, recognized }
    }
}

/// Match one template, folding every failure into a miss
fn check<M: TemplateMatchable>(
    matcher: &M,
    misfits: &mut HashSet<TemplateId>,
    frame: &GrayImage,
    template: &Template,
    threshold: f64,
) -> MatchResult {
    match matcher.match_template(frame, &template.image, threshold) {
        Ok(result) => result,
        Err(e @ CvError::InvalidTemplateSize { .. }) => {
            if misfits.insert(template.id.clone()) {
                warn!(template = %template.id, error = %e, "template excluded from matching");
            }
            MatchResult::miss()
        }
        Err(e) => {
            warn!(template = %template.id, error = %e, "template match failed");
            MatchResult::miss()
        }
    }
}
