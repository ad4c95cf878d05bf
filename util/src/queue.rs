use num_format::{CustomFormat, ToFormattedString};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info};

const DEFAULT_WARNING_DEPTH: usize = 1_000;

/// Spawns a background thread that polls `depth` once a second and logs
/// when the queue grows past `warning_depth` — the bounded-queue
/// backpressure surface (§5) made observable. Returns a handle whose
/// `stop()` ends the monitor; dropping the handle also stops it.
pub struct QueueMonitor {
    stop: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl QueueMonitor {
    pub fn spawn<F>(name: impl Into<String>, depth: F) -> Self
    where
        F: Fn() -> usize + Send + 'static,
    {
        Self::spawn_with_threshold(name, depth, DEFAULT_WARNING_DEPTH)
    }

    pub fn spawn_with_threshold<F>(name: impl Into<String>, depth: F, warning_depth: usize) -> Self
    where
        F: Fn() -> usize + Send + 'static,
    {
        let name = name.into();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = stop.clone();

        let handle = thread::spawn(move || {
            let format = CustomFormat::builder().separator("'").build().unwrap();
            let mut overwhelmed = false;
            let mut last_log = Instant::now();

            while !stop_clone.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_secs(1));
                let len = depth();
                if len > warning_depth {
                    if last_log.elapsed() > Duration::from_secs(10) {
                        error!("queue {} too big: {}", name, len.to_formatted_string(&format));
                        last_log = Instant::now();
                        overwhelmed = true;
                    }
                } else if overwhelmed {
                    info!("queue {} relaxed: {}", name, len.to_formatted_string(&format));
                    overwhelmed = false;
                }
            }
        });

        QueueMonitor {
            stop,
            handle: Some(handle),
        }
    }

    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for QueueMonitor {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn monitor_can_be_stopped() {
        let depth = Arc::new(AtomicUsize::new(0));
        let depth_clone = depth.clone();
        let monitor = QueueMonitor::spawn("test", move || depth_clone.load(Ordering::Relaxed));
        monitor.stop();
    }
}
