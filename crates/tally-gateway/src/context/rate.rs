//! Request-rate counter and its periodic reset loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Requests seen in the current reset window.
///
/// Cloning shares the same counter.
#[derive(Debug, Clone, Default)]
pub struct RateCounter {
    count: Arc<AtomicU64>,
}

impl RateCounter {
    pub fn new(initial: u64) -> Self {
        Self {
            count: Arc::new(AtomicU64::new(initial)),
        }
    }

    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn read(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Zero the counter, returning the value it held.
    pub fn reset(&self) -> u64 {
        self.count.swap(0, Ordering::Relaxed)
    }

    pub(crate) fn restore(&self, v: u64) {
        self.count.store(v, Ordering::Relaxed);
    }

    /// Spawn the reset loop on the current runtime.
    ///
    /// The first reset fires after `interval - initial_delay` (saturating at
    /// zero), so a restarted process keeps the cadence of the one it replaced;
    /// after that it fires every `interval`. The loop exits once `shutdown`
    /// flips to `true` or its sender is dropped.
    pub fn spawn_reset_loop(
        &self,
        interval: Duration,
        initial_delay: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let counter = self.clone();
        tokio::spawn(async move {
            // A shutdown sent before `subscribe` never fires `changed()`.
            if *shutdown.borrow_and_update() {
                tracing::debug!("rate reset loop not started, already shut down");
                return;
            }

            let mut wait = interval.saturating_sub(initial_delay);
            tracing::debug!(first_reset_in = ?wait, ?interval, "rate reset loop started");

            loop {
                tokio::select! {
                    _ = sleep(wait) => {
                        let prev = counter.reset();
                        tracing::debug!(prev, "rate counter reset");
                        wait = interval;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            tracing::debug!("rate reset loop stopped");
                            break;
                        }
                    }
                }
            }
        })
    }
}
