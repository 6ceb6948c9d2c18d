//! Fixed-interval update runner.
//!
//! One dedicated thread per subsystem drives its tick at the configured
//! interval. Pacing follows the measured cycle duration: sleep for the
//! remainder of the interval, warn when a cycle overruns it. The sleep
//! is sliced so a stop request takes effect within one slice instead of
//! one full interval.

use plant_registry::RegistryResult;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

const SLEEP_SLICE: Duration = Duration::from_millis(50);

/// Handle to a running update thread.
pub struct UpdateRunner {
    name: &'static str,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl UpdateRunner {
    /// Spawn the update thread. `tick` runs once per interval; a failed
    /// cycle is logged and the loop carries on.
    pub fn spawn<F>(name: &'static str, interval: Duration, tick: F) -> Self
    where
        F: Fn() -> RegistryResult<()> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let handle = thread::spawn(move || {
            info!(
                runner = name,
                interval_ms = interval.as_millis() as u64,
                "update runner started"
            );
            while !stop_flag.load(Ordering::Relaxed) {
                let cycle_start = Instant::now();
                if let Err(err) = tick() {
                    error!(runner = name, %err, "update cycle failed");
                }

                let elapsed = cycle_start.elapsed();
                if elapsed >= interval {
                    warn!(
                        runner = name,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "update cycle overran its interval"
                    );
                    continue;
                }
                let deadline = cycle_start + interval;
                while !stop_flag.load(Ordering::Relaxed) {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    thread::sleep((deadline - now).min(SLEEP_SLICE));
                }
            }
            debug!(runner = name, "update runner stopped");
        });
        Self {
            name,
            stop,
            handle: Some(handle),
        }
    }

    /// Signal the loop and wait for the in-flight cycle to finish.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!(runner = self.name, "update thread panicked");
            }
        }
    }
}

impl Drop for UpdateRunner {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
