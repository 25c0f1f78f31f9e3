use anyhow::Context;
use clap::Parser;
use cooldown_core::{DetectionEvent, EventSink, Fanout, FnSink, Settings, TimerEvent, TimerRegistry, TimerTicker};
use cooldown_cv::{CooldownDetector, DetectionLoop};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod frames;

use frames::ReplaySource;

/// Track ability cooldowns by recognizing their icons on screen
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Settings file; written with defaults if it does not exist
    #[arg(long, default_value = "settings.json")]
    settings: PathBuf,

    /// Image file or directory of images to replay as captured frames
    #[arg(long)]
    frames: PathBuf,

    /// Seconds to run before stopping
    #[arg(long, default_value_t = 30.0)]
    run_for: f64,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let run_for = run_duration(args.run_for)?;
    let settings = Settings::load_or_init(&args.settings)?;
    let base_dir = args.settings.parent().filter(|p| !p.as_os_str().is_empty());

    let detector = CooldownDetector::load(&settings, base_dir)?;
    let source = ReplaySource::open(&args.frames)
        .with_context(|| format!("Failed to open frames: {:?}", args.frames))?;
    info!(frames = source.len(), "replaying captured frames");

    let display: Arc<dyn EventSink<TimerEvent>> = Arc::new(FnSink(|event: TimerEvent| match event {
        TimerEvent::Updated { label, .. } => info!(target: "display", "{}", label),
        TimerEvent::Removed { template_id } => info!(target: "display", "{} removed", template_id),
    }));
    let registry = Arc::new(TimerRegistry::new(settings.cooldowns(), display));

    let notices: Arc<dyn EventSink<DetectionEvent>> = Arc::new(FnSink(|event: DetectionEvent| match event {
        DetectionEvent::Recognized(recognition) => {
            info!(target: "display", "recognized {}", recognition.template_id)
        }
        DetectionEvent::Degraded { consecutive_failures } => {
            warn!(target: "display", consecutive_failures, "screen capture is failing")
        }
        DetectionEvent::Recovered => info!(target: "display", "screen capture recovered"),
    }));
    let detection_sink = Fanout::new()
        .with(Arc::clone(&registry) as Arc<dyn EventSink<DetectionEvent>>)
        .with(notices);

    let mut ticker = TimerTicker::start(Arc::clone(&registry), settings.tick_interval());
    let mut detection = DetectionLoop::new(detector, Box::new(source), Arc::new(detection_sink));
    detection.start();

    std::thread::sleep(run_for);

    detection.stop();
    ticker.stop();
    info!(
        active_timers = registry.len(),
        late_ticks = ticker.late_ticks(),
        "session ended"
    );
    Ok(())
}

fn run_duration(seconds: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(seconds)
        .with_context(|| format!("--run-for must be a non-negative number of seconds, got {}", seconds))
}
