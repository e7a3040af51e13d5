//! Per-process request context.
//!
//! `Context` is what every view receives: the request-rate counter, the shared
//! store, route statistics and snapshot persistence. One is built per process
//! start; it owns the reset loop's shutdown signal.

pub mod persistence;
pub mod rate;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use tally_core::error::Result;
use tally_core::{StatsTracker, Store};

use crate::config::StateSection;

pub use persistence::PersistenceManager;
pub use rate::RateCounter;

pub struct Context {
    rate: RateCounter,
    store: Arc<Store<Value>>,
    stats: StatsTracker,
    persistence: PersistenceManager,
    started_at: DateTime<Utc>,
    reset_interval: Duration,
    shutdown: watch::Sender<bool>,
}

impl Context {
    /// Fresh context over `store`. No recovery, no reset loop.
    pub fn new(store: Arc<Store<Value>>, cfg: &StateSection) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            rate: RateCounter::new(0),
            stats: StatsTracker::new(Arc::clone(&store)),
            persistence: PersistenceManager::new(cfg.path.clone(), cfg.reset_interval_secs),
            store,
            started_at: Utc::now(),
            reset_interval: Duration::from_secs(cfg.reset_interval_secs),
            shutdown,
        }
    }

    /// Build the process context: optionally recover the previous snapshot,
    /// then start the reset loop aligned to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(store: Arc<Store<Value>>, cfg: &StateSection) -> Arc<Self> {
        let ctx = Arc::new(Self::new(store, cfg));
        let delay = if cfg.recover_on_start {
            ctx.persistence.recover(&ctx)
        } else {
            0
        };
        // Detached: the loop ends on `shutdown()` or with the runtime.
        let _ = ctx.start_reset_loop(delay);
        ctx
    }

    /// Spawn the reset loop; `delay_secs` of the first window have already
    /// elapsed.
    pub fn start_reset_loop(&self, delay_secs: u64) -> JoinHandle<()> {
        self.rate.spawn_reset_loop(
            self.reset_interval,
            Duration::from_secs(delay_secs),
            self.shutdown.subscribe(),
        )
    }

    /// Stop the reset loop.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Count one inbound request.
    pub fn hit(&self) {
        self.rate.increment();
    }

    pub fn rpm(&self) -> u64 {
        self.rate.read()
    }

    pub fn rate(&self) -> &RateCounter {
        &self.rate
    }

    pub fn store(&self) -> &Arc<Store<Value>> {
        &self.store
    }

    pub fn stats(&self) -> &StatsTracker {
        &self.stats
    }

    pub fn persistence(&self) -> &PersistenceManager {
        &self.persistence
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Write the current state to the snapshot file.
    pub fn flush(&self) -> Result<()> {
        self.persistence.flush(self)
    }

    /// Load the snapshot into this context; returns the reset-loop delay.
    pub fn load(&self) -> Result<u64> {
        self.persistence.load(self)
    }
}
