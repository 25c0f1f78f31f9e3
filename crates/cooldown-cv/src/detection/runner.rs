//! Background detection loop

use super::detector::CooldownDetector;
use crate::template::TemplateMatcher;
use crate::traits::{FrameSource, TemplateMatchable};
use cooldown_core::{DetectionEvent, EventSink};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{error, info, trace, warn};

/// Everything the worker thread owns while it runs
struct Session<M: TemplateMatchable> {
    detector: CooldownDetector<M>,
    source: Box<dyn FrameSource>,
    sink: Arc<dyn EventSink<DetectionEvent>>,
}

/// Repeatedly captures a frame and runs a detection pass on it.
///
/// The loop runs on its own thread between `start` and `stop`. Stopping lets
/// the in-flight pass finish and hands the detector and frame source back, so
/// the loop can be started again.
pub struct DetectionLoop<M: TemplateMatchable + 'static = TemplateMatcher> {
    running: Arc<AtomicBool>,
    idle: Option<Session<M>>,
    worker: Option<JoinHandle<Session<M>>>,
}

impl<M: TemplateMatchable + 'static> DetectionLoop<M> {
    pub fn new(
        detector: CooldownDetector<M>,
        source: Box<dyn FrameSource>,
        sink: Arc<dyn EventSink<DetectionEvent>>,
    ) -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            idle: Some(Session {
                detector,
                source,
                sink,
            }),
            worker: None,
        }
    }

    /// Start the worker. Returns `false` if it was already running.
    pub fn start(&mut self) -> bool {
        if self.worker.is_some() {
            trace!("detection loop already running");
            return false;
        }
        let Some(session) = self.idle.take() else {
            warn!("detection session was lost to a worker panic; cannot restart");
            return false;
        };

        self.running.store(true, Ordering::SeqCst);
        let running = Arc::clone(&self.running);
        self.worker = Some(thread::spawn(move || run(session, running)));
        info!("detection loop started");
        true
    }

    /// Stop the worker and wait for it to exit. Returns `false` if it was not running.
    pub fn stop(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return false;
        };

        self.running.store(false, Ordering::SeqCst);
        worker.thread().unpark();
        match worker.join() {
            Ok(session) => self.idle = Some(session),
            Err(_) => error!("detection worker panicked"),
        }
        info!("detection loop stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl<M: TemplateMatchable + 'static> Drop for DetectionLoop<M> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<M: TemplateMatchable>(mut session: Session<M>, running: Arc<AtomicBool>) -> Session<M> {
    let poll_interval = session.detector.config().poll_interval;
    let degraded_after = session.detector.config().degraded_after;
    let mut failures: u32 = 0;

    while running.load(Ordering::SeqCst) {
        match session.source.capture() {
            Ok(frame) => {
                if failures >= degraded_after {
                    info!("frame capture recovered");
                    session.sink.publish(DetectionEvent::Recovered);
                }
                failures = 0;

                let outcome = session.detector.scan(&frame, session.sink.as_ref());
                trace!(
                    gated = outcome.gated(),
                    recognized = outcome.recognized.len(),
                    "detection pass done"
                );
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                warn!(error = %e, consecutive_failures = failures, "frame capture failed");
                if failures == degraded_after {
                    session.sink.publish(DetectionEvent::Degraded {
                        consecutive_failures: failures,
                    });
                }
            }
        }

        if running.load(Ordering::SeqCst) {
            thread::park_timeout(poll_interval);
        }
    }

    session
}
