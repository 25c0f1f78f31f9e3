//! High-level detection module

pub mod config;
pub mod detector;
pub mod runner;

pub use config::DetectionConfig;
pub use detector::{CooldownDetector, ScanOutcome};
pub use runner::DetectionLoop;
