//! Per-route response time tracking.
//!
//! Each known route owns a `RouteBucket` entry in the shared store. The bucket
//! keeps the last `STATS_WINDOW` execution times (nanoseconds) and the mean of
//! the window as it stood right after the newest sample was appended.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TallyError};
use crate::store::Store;

/// Number of samples kept per route.
pub const STATS_WINDOW: usize = 5;

const NANOS_PER_MILLI: f64 = 1_000_000.0;

/// Rolling execution-time window for one route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteBucket {
    /// Newest last; at most `STATS_WINDOW` entries.
    #[serde(rename = "exec_times_ns", default)]
    pub exec_times: Vec<u64>,
    #[serde(rename = "response_time_ms", default)]
    pub avg_response_time: f64,
}

impl RouteBucket {
    /// Append a sample, recompute the average, then trim to the window.
    ///
    /// The average includes the sample that the trim may evict right after.
    pub fn push(&mut self, exec_time: Duration) {
        let nanos = u64::try_from(exec_time.as_nanos()).unwrap_or(u64::MAX);
        self.exec_times.push(nanos);

        let total: u128 = self.exec_times.iter().map(|&v| u128::from(v)).sum();
        let mean = total / self.exec_times.len() as u128;
        self.avg_response_time = mean as f64 / NANOS_PER_MILLI;

        if self.exec_times.len() > STATS_WINDOW {
            self.exec_times.remove(0);
        }
    }

    fn from_value(v: &Value) -> Result<Self> {
        Self::deserialize(v).map_err(|e| TallyError::Internal(format!("corrupt route bucket: {e}")))
    }

    fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| TallyError::Serialize(e.to_string()))
    }
}

/// Maintains route buckets inside the shared store.
#[derive(Debug, Clone)]
pub struct StatsTracker {
    store: Arc<Store<Value>>,
}

impl StatsTracker {
    pub fn new(store: Arc<Store<Value>>) -> Self {
        Self { store }
    }

    /// Create an empty bucket for `route`. Existing samples are discarded.
    pub fn register(&self, route: &str) -> Result<()> {
        self.store.set(route, RouteBucket::default().to_value()?);
        Ok(())
    }

    /// Feed one execution time into the bucket of `route`.
    ///
    /// Fails with `KeyNotFound` when the route was never registered.
    pub fn record(&self, route: &str, exec_time: Duration) -> Result<RouteBucket> {
        self.store.update(route, |slot| {
            let mut bucket = RouteBucket::from_value(slot)?;
            bucket.push(exec_time);
            *slot = bucket.to_value()?;
            Ok(bucket)
        })?
    }

    pub fn bucket(&self, route: &str) -> Result<RouteBucket> {
        RouteBucket::from_value(&self.store.get(route)?)
    }
}
