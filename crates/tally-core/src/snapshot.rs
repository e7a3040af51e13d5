//! On-disk snapshot format and the resume policy applied on recovery.
//!
//! Wire shape (JSON):
//! ```text
//! { "last_active_at": RFC3339, "last_started_at": RFC3339,
//!   "cache_state": { ... }, "rpm": u64 }
//! ```
//! Decoding is all-or-nothing: a snapshot whose shape or timestamps do not
//! parse is rejected as a whole.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, TallyError};

/// Default rate window, used by the reset loop and the staleness check.
pub const RATE_WINDOW_SECS: u64 = 60;

/// Decoded snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedSnapshot {
    pub last_active_at: DateTime<Utc>,
    pub last_started_at: DateTime<Utc>,
    pub cache_state: Map<String, Value>,
    pub rate_count: u64,
}

#[derive(Serialize, Deserialize)]
struct WireSnapshot {
    last_active_at: String,
    last_started_at: String,
    cache_state: Map<String, Value>,
    rpm: u64,
}

impl PersistedSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let wire = WireSnapshot {
            last_active_at: self.last_active_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            last_started_at: self.last_started_at.to_rfc3339_opts(SecondsFormat::Nanos, true),
            cache_state: self.cache_state.clone(),
            rpm: self.rate_count,
        };
        serde_json::to_vec(&wire).map_err(|e| TallyError::Serialize(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let wire: WireSnapshot = serde_json::from_slice(bytes)
            .map_err(|e| TallyError::StateLoad(format!("invalid snapshot json: {e}")))?;

        let last_active_at = DateTime::parse_from_rfc3339(&wire.last_active_at)?.with_timezone(&Utc);
        let last_started_at = DateTime::parse_from_rfc3339(&wire.last_started_at)?.with_timezone(&Utc);

        Ok(Self {
            last_active_at,
            last_started_at,
            cache_state: wire.cache_state,
            rate_count: wire.rpm,
        })
    }

    /// Decide how a new process should pick up from this snapshot at `now`,
    /// given a reset window of `window_secs`.
    ///
    /// Downtime of a full window or more discards the counter. Otherwise the
    /// counter is adopted and the delay is how long the previous process had
    /// been running, so the reset cadence lines up with it.
    pub fn resume_plan(&self, now: DateTime<Utc>, window_secs: u64) -> ResumePlan {
        let downtime = now.signed_duration_since(self.last_active_at).num_seconds();
        if downtime >= i64::try_from(window_secs).unwrap_or(i64::MAX) {
            return ResumePlan {
                rate_count: 0,
                delay_secs: 0,
                stale: true,
            };
        }

        let running = now.signed_duration_since(self.last_started_at).num_seconds();
        ResumePlan {
            rate_count: self.rate_count,
            delay_secs: u64::try_from(running).unwrap_or(0),
            stale: false,
        }
    }
}

/// Outcome of the resume policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumePlan {
    pub rate_count: u64,
    /// Seconds of the current reset window already elapsed.
    pub delay_secs: u64,
    pub stale: bool,
}
