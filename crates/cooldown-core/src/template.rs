use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Stable identity of a template, derived from the path it was configured with.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn from_path(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TemplateId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// What the timer registry needs to know about a cooldown template.
#[derive(Debug, Clone, PartialEq)]
pub struct CooldownSpec {
    pub id: TemplateId,
    pub display_name: String,
    pub cooldown: Duration,
}

impl CooldownSpec {
    pub fn new(id: impl Into<TemplateId>, display_name: impl Into<String>, cooldown: Duration) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            cooldown,
        }
    }
}
