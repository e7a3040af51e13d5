//! Snapshot persistence for the request context.
//!
//! - `flush`: write the current counter + store contents (atomic temp + rename).
//! - `load`: read a snapshot back and apply the resume policy.
//! - `recover`: `load`, discarding the file when it cannot be used.
//!
//! Concurrent flushes are not serialized: each writes its own temp file and
//! the last rename wins.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Map;
use tempfile::NamedTempFile;

use tally_core::error::{Result, TallyError};
use tally_core::PersistedSnapshot;

use super::Context;

#[derive(Debug, Clone)]
pub struct PersistenceManager {
    path: PathBuf,
    window_secs: u64,
}

impl PersistenceManager {
    pub fn new(path: impl Into<PathBuf>, window_secs: u64) -> Self {
        Self {
            path: path.into(),
            window_secs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serialize `ctx` and replace the snapshot file.
    pub fn flush(&self, ctx: &Context) -> Result<()> {
        let snapshot = PersistedSnapshot {
            last_active_at: Utc::now(),
            last_started_at: ctx.started_at(),
            cache_state: ctx.store().snapshot().into_iter().collect::<Map<_, _>>(),
            rate_count: ctx.rpm(),
        };
        let dump = snapshot.encode()?;

        let dir = self
            .path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;

        // Atomic write: per-flush temp file in the same dir + fsync + rename
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&dump)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| TallyError::Io(e.error))?;

        tracing::debug!(path = %self.path.display(), rpm = snapshot.rate_count, entries = snapshot.cache_state.len(), "state flushed");
        Ok(())
    }

    /// Read the snapshot and apply it to `ctx`, returning the reset-loop delay
    /// in seconds.
    pub fn load(&self, ctx: &Context) -> Result<u64> {
        self.load_at(ctx, Utc::now())
    }

    /// `load` with an explicit clock.
    ///
    /// Nothing in `ctx` changes unless the whole snapshot decodes.
    pub fn load_at(&self, ctx: &Context, now: DateTime<Utc>) -> Result<u64> {
        let raw = fs::read(&self.path)
            .map_err(|e| TallyError::StateLoad(format!("read {} failed: {e}", self.path.display())))?;
        let snapshot = PersistedSnapshot::decode(&raw)?;
        let plan = snapshot.resume_plan(now, self.window_secs);

        ctx.store().restore(snapshot.cache_state);
        ctx.rate().restore(plan.rate_count);

        tracing::info!(
            rpm = plan.rate_count,
            delay_secs = plan.delay_secs,
            stale = plan.stale,
            "state recovered"
        );
        Ok(plan.delay_secs)
    }

    /// `load`, or start fresh: an unusable snapshot is deleted so later
    /// restarts do not trip over it again.
    pub fn recover(&self, ctx: &Context) -> u64 {
        match self.load(ctx) {
            Ok(delay) => delay,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "state not recovered, starting fresh");
                match fs::remove_file(&self.path) {
                    Ok(()) => {}
                    Err(err) if err.kind() == ErrorKind::NotFound => {}
                    Err(err) => {
                        tracing::warn!(path = %self.path.display(), error = %err, "failed to remove snapshot")
                    }
                }
                0
            }
        }
    }
}
