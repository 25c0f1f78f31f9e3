//! Fixed-cadence driver for [`TimerRegistry::tick`]

use super::registry::TimerRegistry;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Background thread ticking a registry with the measured time since the
/// previous tick, so a delayed tick still decays by the real elapsed time.
pub struct TimerTicker {
    interval: Duration,
    running: Arc<AtomicBool>,
    late_ticks: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl TimerTicker {
    pub fn start(registry: Arc<TimerRegistry>, interval: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let late_ticks = Arc::new(AtomicU64::new(0));

        let handle = {
            let running = Arc::clone(&running);
            let late_ticks = Arc::clone(&late_ticks);
            thread::spawn(move || {
                let late_after = interval.mul_f64(1.5);
                let mut last = Instant::now();
                while running.load(Ordering::SeqCst) {
                    thread::park_timeout(interval.saturating_sub(last.elapsed()));
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }
                    let elapsed = last.elapsed();
                    if elapsed < interval {
                        continue;
                    }
                    last += elapsed;

                    if elapsed > late_after {
                        late_ticks.fetch_add(1, Ordering::Relaxed);
                        debug!(?elapsed, "timer tick delayed");
                    }
                    registry.tick(elapsed);
                }
            })
        };

        Self {
            interval,
            running,
            late_ticks,
            handle: Some(handle),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ticks that arrived more than half an interval late
    pub fn late_ticks(&self) -> u64 {
        self.late_ticks.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Stop ticking and wait for the thread to exit
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.thread().unpark();
            if handle.join().is_err() {
                error!("timer ticker thread panicked");
            }
        }
    }
}

impl Drop for TimerTicker {
    fn drop(&mut self) {
        self.stop();
    }
}
