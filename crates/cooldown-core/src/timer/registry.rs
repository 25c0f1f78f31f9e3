//! Owner of every live cooldown countdown

use super::clock::format_clock;
use crate::events::{DetectionEvent, EventSink, TimerEvent};
use crate::template::{CooldownSpec, TemplateId};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// One running countdown
#[derive(Debug, Clone, PartialEq)]
pub struct TimerEntry {
    pub template_id: TemplateId,
    pub display_name: String,
    pub remaining: Duration,
    pub active: bool,
}

impl TimerEntry {
    pub fn label(&self) -> String {
        format!("{}: {}", self.display_name, format_clock(self.remaining))
    }

    fn update_event(&self) -> TimerEvent {
        TimerEvent::Updated {
            template_id: self.template_id.clone(),
            label: self.label(),
            remaining: self.remaining,
        }
    }
}

/// Thread-safe registry of countdowns keyed by template.
///
/// `on_recognized` and `tick` take the same lock, so arming and decay of one
/// template never interleave. Events are published while the lock is held,
/// which keeps each template's update/removal stream in order.
pub struct TimerRegistry {
    cooldowns: HashMap<TemplateId, CooldownSpec>,
    entries: Mutex<BTreeMap<TemplateId, TimerEntry>>,
    sink: Arc<dyn EventSink<TimerEvent>>,
}

impl TimerRegistry {
    pub fn new<I>(cooldowns: I, sink: Arc<dyn EventSink<TimerEvent>>) -> Self
    where
        I: IntoIterator<Item = CooldownSpec>,
    {
        Self {
            cooldowns: cooldowns.into_iter().map(|c| (c.id.clone(), c)).collect(),
            entries: Mutex::new(BTreeMap::new()),
            sink,
        }
    }

    /// Arm the countdown for `template_id`.
    ///
    /// Returns `true` if a new entry was created. A template that already has an
    /// active entry is left untouched, as is one with no configured cooldown.
    pub fn on_recognized(&self, template_id: &TemplateId) -> bool {
        let Some(spec) = self.cooldowns.get(template_id) else {
            warn!(template = %template_id, "recognized template has no cooldown configured");
            return false;
        };

        let mut entries = self.entries.lock();
        if entries.get(template_id).is_some_and(|e| e.active) {
            debug!(template = %template_id, "cooldown already running");
            return false;
        }

        let entry = TimerEntry {
            template_id: template_id.clone(),
            display_name: spec.display_name.clone(),
            remaining: spec.cooldown,
            active: true,
        };
        info!(template = %template_id, cooldown = ?spec.cooldown, "cooldown started");
        self.sink.publish(entry.update_event());
        entries.insert(template_id.clone(), entry);
        true
    }

    /// Advance every active countdown by `dt`, removing the ones that run out.
    pub fn tick(&self, dt: Duration) {
        let mut entries = self.entries.lock();
        entries.retain(|template_id, entry| {
            entry.remaining = entry.remaining.saturating_sub(dt);
            if entry.remaining.is_zero() {
                entry.active = false;
                info!(template = %template_id, "cooldown finished");
                self.sink.publish(TimerEvent::Removed {
                    template_id: template_id.clone(),
                });
                false
            } else {
                self.sink.publish(entry.update_event());
                true
            }
        });
    }

    /// Copy of the active entries, ordered by template id
    pub fn snapshot(&self) -> Vec<TimerEntry> {
        self.entries.lock().values().cloned().collect()
    }

    pub fn remaining(&self, template_id: &TemplateId) -> Option<Duration> {
        self.entries.lock().get(template_id).map(|e| e.remaining)
    }

    pub fn is_active(&self, template_id: &TemplateId) -> bool {
        self.entries
            .lock()
            .get(template_id)
            .is_some_and(|e| e.active)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl EventSink<DetectionEvent> for TimerRegistry {
    fn publish(&self, event: DetectionEvent) {
        if let DetectionEvent::Recognized(recognition) = event {
            self.on_recognized(&recognition.template_id);
        }
    }
}
