// tests/engine_tests.rs
use cooldown_core::{
    CooldownSpec, DetectionEvent, EventSink, Fanout, GateSettings, Settings, TemplateId,
    TemplateSettings, TimerEvent, TimerRegistry,
};
use cooldown_cv::{CooldownDetector, CvError, DetectionConfig, DetectionLoop, FnFrameSource, Template};
use image::{imageops, GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

const GATE: &str = "images/mp_zero.png";
const HELLFIRE: &str = "images/hellfire.png";

fn noise(width: u32, height: u32, seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    GrayImage::from_fn(width, height, |_, _| Luma([rng.gen_range(0..=255)]))
}

fn gate_icon() -> GrayImage {
    noise(12, 12, 100)
}

fn hellfire_icon() -> GrayImage {
    noise(12, 12, 101)
}

/// A screen with the gate and/or the hellfire icon pasted onto background noise
fn screen(with_gate: bool, with_hellfire: bool) -> GrayImage {
    let mut frame = noise(96, 64, 1);
    if with_gate {
        imageops::replace(&mut frame, &gate_icon(), 10, 40);
    }
    if with_hellfire {
        imageops::replace(&mut frame, &hellfire_icon(), 60, 8);
    }
    frame
}

fn detector_with(config: DetectionConfig) -> CooldownDetector {
    CooldownDetector::new(
        config,
        Template::new(GATE.into(), "gate".to_string(), gate_icon()),
        vec![Template::new(HELLFIRE.into(), "Hellfire".to_string(), hellfire_icon())],
    )
}

fn detector() -> CooldownDetector {
    detector_with(DetectionConfig::default())
}

fn fast_polling() -> DetectionConfig {
    DetectionConfig {
        poll_interval: Duration::from_millis(1),
        ..DetectionConfig::default()
    }
}

fn registry() -> (Arc<TimerRegistry>, Receiver<TimerEvent>) {
    let (tx, rx) = mpsc::channel::<TimerEvent>();
    let registry = TimerRegistry::new(
        [CooldownSpec::new(HELLFIRE, "Hellfire", Duration::from_millis(8_500))],
        Arc::new(tx),
    );
    (Arc::new(registry), rx)
}

fn removals(events: &Receiver<TimerEvent>) -> usize {
    events
        .try_iter()
        .filter(|e| matches!(e, TimerEvent::Removed { .. }))
        .count()
}

#[test]
fn test_gated_recognition_runs_full_cooldown() {
    let mut detector = detector();
    let (registry, events) = registry();
    let hellfire = TemplateId::new(HELLFIRE);

    let outcome = detector.scan(&screen(true, true), &*registry);
    assert_eq!(outcome.recognized, [hellfire.clone()]);
    assert_eq!(registry.remaining(&hellfire), Some(Duration::from_millis(8_500)));

    for ms in [100, 400, 2_000, 3_000, 2_500] {
        registry.tick(Duration::from_millis(ms));
    }
    assert_eq!(registry.remaining(&hellfire), Some(Duration::from_millis(500)));
    assert_eq!(removals(&events), 0);

    registry.tick(Duration::from_millis(500));
    assert!(registry.is_empty());
    assert_eq!(removals(&events), 1);

    registry.tick(Duration::from_millis(500));
    assert_eq!(removals(&events), 0);
}

#[test]
fn test_closed_gate_hides_visible_cooldowns() {
    let mut detector = detector();
    let (registry, _events) = registry();

    for _ in 0..5 {
        let outcome = detector.scan(&screen(false, true), &*registry);
        assert!(!outcome.gated());
        assert!(outcome.gate.confidence <= detector.config().gate_threshold);
        assert!(outcome.recognized.is_empty());
    }
    assert!(registry.is_empty());
}

#[test]
fn test_open_gate_without_icon_recognizes_nothing() {
    let mut detector = detector();
    let (registry, _events) = registry();

    let outcome = detector.scan(&screen(true, false), &*registry);

    assert!(outcome.gated());
    assert!(outcome.recognized.is_empty());
    assert!(registry.is_empty());
}

#[test]
fn test_repeated_recognition_is_debounced() {
    let mut detector = detector();
    let (registry, events) = registry();
    let hellfire = TemplateId::new(HELLFIRE);
    let frame = screen(true, true);

    detector.scan(&frame, &*registry);
    registry.tick(Duration::from_millis(1_000));
    let remaining = registry.remaining(&hellfire);

    detector.scan(&frame, &*registry);
    detector.scan(&frame, &*registry);

    assert_eq!(registry.remaining(&hellfire), remaining);
    assert_eq!(registry.len(), 1);
    // one creation, one tick
    assert_eq!(events.try_iter().count(), 2);
}

#[test]
fn test_rearm_after_expiry() {
    let mut detector = detector();
    let (registry, _events) = registry();
    let hellfire = TemplateId::new(HELLFIRE);
    let frame = screen(true, true);

    detector.scan(&frame, &*registry);
    registry.tick(Duration::from_secs(9));
    assert!(!registry.is_active(&hellfire));

    detector.scan(&frame, &*registry);
    assert_eq!(registry.remaining(&hellfire), Some(Duration::from_millis(8_500)));
}

#[test]
fn test_loop_with_closed_gate_creates_no_timers() {
    let (registry, timer_events) = registry();
    let (tx, detection_events) = mpsc::channel::<DetectionEvent>();
    let sink = Fanout::new()
        .with(Arc::clone(&registry) as Arc<dyn EventSink<DetectionEvent>>)
        .with(Arc::new(tx));

    let captures = Arc::new(AtomicUsize::new(0));
    let source = {
        let captures = Arc::clone(&captures);
        FnFrameSource(move || {
            captures.fetch_add(1, Ordering::SeqCst);
            Ok::<_, CvError>(screen(false, true))
        })
    };
    let detector = detector_with(fast_polling());

    let mut detection = DetectionLoop::new(detector, Box::new(source), Arc::new(sink));
    detection.start();
    while captures.load(Ordering::SeqCst) < 5 {
        std::thread::sleep(Duration::from_millis(1));
    }
    detection.stop();

    assert_eq!(detection_events.try_iter().count(), 0);
    assert_eq!(timer_events.try_iter().count(), 0);
    assert!(registry.is_empty());
}

#[test]
fn test_loop_feeds_registry() {
    let (registry, timer_events) = registry();
    let frames = Arc::new(AtomicUsize::new(0));
    let source = {
        let frames = Arc::clone(&frames);
        FnFrameSource(move || {
            // gate opens on the third frame
            let n = frames.fetch_add(1, Ordering::SeqCst);
            Ok::<_, CvError>(screen(n >= 2, true))
        })
    };
    let detector = detector_with(fast_polling());

    let sink = Arc::clone(&registry) as Arc<dyn EventSink<DetectionEvent>>;
    let mut detection = DetectionLoop::new(detector, Box::new(source), sink);
    detection.start();
    while frames.load(Ordering::SeqCst) < 6 {
        std::thread::sleep(Duration::from_millis(1));
    }
    detection.stop();

    assert_eq!(registry.len(), 1);
    let created: Vec<String> = timer_events
        .try_iter()
        .filter_map(|e| match e {
            TimerEvent::Updated { label, .. } => Some(label),
            TimerEvent::Removed { .. } => None,
        })
        .collect();
    assert_eq!(created, ["Hellfire: 00:08.5"]);
}

#[test]
fn test_detector_from_settings_skips_bad_templates() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    std::fs::create_dir_all(dir.path().join("images"))?;
    gate_icon().save(dir.path().join(GATE))?;
    hellfire_icon().save(dir.path().join(HELLFIRE))?;
    noise(200, 200, 7).save(dir.path().join("images/huge.png"))?;
    std::fs::write(dir.path().join("images/broken.png"), "not a png")?;

    let settings = Settings {
        gate: GateSettings {
            path: GATE.into(),
            threshold: 0.85,
        },
        templates: vec![
            TemplateSettings {
                path: "images/broken.png".into(),
                name: "Broken".to_string(),
                duration: 5.0,
            },
            TemplateSettings {
                path: "images/huge.png".into(),
                name: "Huge".to_string(),
                duration: 5.0,
            },
            TemplateSettings {
                path: HELLFIRE.into(),
                name: "Hellfire".to_string(),
                duration: 8.5,
            },
        ],
        ..Settings::default()
    };
    let settings_path = dir.path().join("settings.json");
    settings.save(&settings_path)?;
    let settings = Settings::load(&settings_path)?;

    let mut detector = CooldownDetector::load(&settings, Some(dir.path()))?;
    let ids: Vec<&str> = detector.template_ids().map(|id| id.as_str()).collect();
    assert_eq!(ids, ["images/huge.png", HELLFIRE]);
    assert_eq!(detector.config().gate_threshold, 0.85);

    let (tx, _rx) = mpsc::channel::<TimerEvent>();
    let registry = TimerRegistry::new(settings.cooldowns(), Arc::new(tx));
    let outcome = detector.scan(&screen(true, true), &registry);

    assert_eq!(outcome.recognized, [TemplateId::new(HELLFIRE)]);
    assert!(registry.is_active(&TemplateId::new(HELLFIRE)));
    Ok(())
}
