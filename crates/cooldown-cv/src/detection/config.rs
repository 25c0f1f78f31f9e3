//! Detection configuration

use crate::template::TemplateConfig;
use cooldown_core::Settings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Matcher settings for the cooldown templates
    pub template_config: TemplateConfig,
    /// Threshold the gate must exceed before cooldowns are checked
    pub gate_threshold: f64,
    pub poll_interval: Duration,
    /// Consecutive capture failures before a degraded notice is published
    pub degraded_after: u32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            template_config: TemplateConfig::default(),
            gate_threshold: 0.8,
            poll_interval: Duration::from_millis(50),
            degraded_after: 3,
        }
    }
}

impl DetectionConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            template_config: TemplateConfig {
                threshold: settings.match_threshold,
                ..TemplateConfig::default()
            },
            gate_threshold: settings.gate.threshold,
            poll_interval: settings.poll_interval(),
            degraded_after: settings.degraded_after,
        }
    }
}
