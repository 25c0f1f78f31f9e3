//! Countdown timers driven by recognition events

pub mod clock;
pub mod registry;
pub mod ticker;

pub use clock::format_clock;
pub use registry::{TimerEntry, TimerRegistry};
pub use ticker::TimerTicker;
