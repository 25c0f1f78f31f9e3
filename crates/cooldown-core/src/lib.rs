//! Cooldown tracking core
//!
//! Template identity, run settings, the event plumbing between the detection
//! loop and the presentation layer, and the countdown timer registry.

pub mod events;
pub mod settings;
pub mod template;
pub mod timer;

pub use events::{DetectionEvent, EventSink, Fanout, FnSink, RecognitionEvent, TimerEvent};
pub use settings::{GateSettings, Settings, TemplateSettings};
pub use template::{CooldownSpec, TemplateId};
pub use timer::{TimerEntry, TimerRegistry, TimerTicker, format_clock};

pub type Result<T> = anyhow::Result<T>;
