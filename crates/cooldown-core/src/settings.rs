//! Run settings loaded once at startup

use crate::template::{CooldownSpec, TemplateId};
use crate::Result;
use anyhow::{Context, bail, ensure};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Resolved settings for one detection session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub gate: GateSettings,
    #[serde(default = "default_templates")]
    pub templates: Vec<TemplateSettings>,
    #[serde(default = "default_threshold")]
    pub match_threshold: f64,
    /// Seconds between detection passes
    #[serde(default = "default_sleep_duration")]
    pub sleep_duration: f64,
    /// Seconds between timer ticks
    #[serde(default = "default_tick_interval")]
    pub tick_interval: f64,
    /// Consecutive capture failures before a degraded notice
    #[serde(default = "default_degraded_after")]
    pub degraded_after: u32,
}

/// The template whose presence is required before any cooldown is checked
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSettings {
    pub path: PathBuf,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSettings {
    pub path: PathBuf,
    pub name: String,
    /// Cooldown in seconds
    pub duration: f64,
}

impl TemplateSettings {
    pub fn id(&self) -> TemplateId {
        TemplateId::from_path(&self.path)
    }
}

fn default_templates() -> Vec<TemplateSettings> {
    vec![
        TemplateSettings {
            path: "images/hellfire.png".into(),
            name: "Hellfire".to_string(),
            duration: 9.0,
        },
        TemplateSettings {
            path: "images/crosshellfire.png".into(),
            name: "Cross Hellfire".to_string(),
            duration: 60.0,
        },
    ]
}

fn default_threshold() -> f64 {
    0.8
}

fn default_sleep_duration() -> f64 {
    0.05
}

fn default_tick_interval() -> f64 {
    0.1
}

fn default_degraded_after() -> u32 {
    3
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            path: "images/mp_zero.png".into(),
            threshold: default_threshold(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gate: GateSettings::default(),
            templates: default_templates(),
            match_threshold: default_threshold(),
            sleep_duration: default_sleep_duration(),
            tick_interval: default_tick_interval(),
            degraded_after: default_degraded_after(),
        }
    }
}

impl Settings {
    /// Load and validate settings from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {:?}", path))?;
        let settings: Settings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse settings: {:?}", path))?;

        settings
            .validate()
            .with_context(|| format!("Invalid settings in {:?}", path))?;
        Ok(settings)
    }

    /// Load settings, writing the defaults first if the file does not exist
    pub fn load_or_init<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        let settings = Self::default();
        settings.save(path)?;
        info!(path = %path.display(), "wrote default settings");
        Ok(settings)
    }

    /// Save settings as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, json).with_context(|| format!("Failed to write settings: {:?}", path))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        check_threshold("gate threshold", self.gate.threshold)?;
        check_threshold("match_threshold", self.match_threshold)?;
        check_positive("sleep_duration", self.sleep_duration)?;
        check_positive("tick_interval", self.tick_interval)?;
        ensure!(self.degraded_after > 0, "degraded_after must be at least 1");

        let gate_id = self.gate_id();
        let mut seen = HashSet::new();
        for template in &self.templates {
            let id = template.id();
            check_positive(&format!("duration of {}", id), template.duration)?;
            if id == gate_id {
                bail!("{} is configured as both the gate and a cooldown template", id);
            }
            if !seen.insert(id.clone()) {
                bail!("template {} is configured more than once", id);
            }
        }

        Ok(())
    }

    pub fn gate_id(&self) -> TemplateId {
        TemplateId::from_path(&self.gate.path)
    }

    /// Cooldown specs in configuration order
    pub fn cooldowns(&self) -> Vec<CooldownSpec> {
        self.templates
            .iter()
            .map(|t| CooldownSpec::new(t.id(), t.name.clone(), seconds(t.duration)))
            .collect()
    }

    pub fn poll_interval(&self) -> Duration {
        seconds(self.sleep_duration)
    }

    pub fn tick_interval(&self) -> Duration {
        seconds(self.tick_interval)
    }
}

fn check_threshold(what: &str, value: f64) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&value),
        "{} must be within [0, 1], got {}",
        what,
        value
    );
    Ok(())
}

fn check_positive(what: &str, value: f64) -> Result<()> {
    let duration = Duration::try_from_secs_f64(value)
        .ok()
        .filter(|d| !d.is_zero());
    ensure!(
        duration.is_some(),
        "{} must be a positive number of seconds no larger than {}, got {}",
        what,
        Duration::MAX.as_secs(),
        value
    );
    Ok(())
}

/// Saturating conversion; exact for values that passed `validate`
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::MAX)
}
