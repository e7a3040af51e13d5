//! Shared key/value store.
//!
//! `Store` is a plain map behind a reader/writer lock: any number of `get`
//! calls proceed together, while `set`/`update` are exclusive with everything
//! else. `StoreCell` hands out the one process-wide instance.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::error::{Result, TallyError};

/// Thread-safe in-memory state map keyed by string.
#[derive(Debug)]
pub struct Store<V> {
    state: RwLock<HashMap<String, V>>,
}

impl<V> Default for Store<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Store<V> {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace the value under `key`.
    pub fn set(&self, key: impl Into<String>, val: V) {
        self.state.write().insert(key.into(), val);
    }

    /// Apply `f` to the value under `key` while holding the write lock.
    ///
    /// The whole read-modify-write happens under one lock acquisition, so two
    /// callers updating the same key never overwrite each other.
    pub fn update<R>(&self, key: &str, f: impl FnOnce(&mut V) -> R) -> Result<R> {
        let mut state = self.state.write();
        let val = state
            .get_mut(key)
            .ok_or_else(|| TallyError::KeyNotFound(key.to_string()))?;
        Ok(f(val))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.state.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().is_empty()
    }

    /// Upsert a batch of entries under a single write lock.
    pub fn restore(&self, entries: impl IntoIterator<Item = (String, V)>) {
        let mut state = self.state.write();
        for (k, v) in entries {
            state.insert(k, v);
        }
    }
}

impl<V: Clone> Store<V> {
    /// Return the current value under `key`.
    pub fn get(&self, key: &str) -> Result<V> {
        self.state
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| TallyError::KeyNotFound(key.to_string()))
    }

    /// Clone every entry (consistent point-in-time copy).
    pub fn snapshot(&self) -> HashMap<String, V> {
        self.state.read().clone()
    }
}

/// Execute-once accessor for the process-wide `Store`.
///
/// Owned by the composition root; every `instance()` call returns the same
/// `Arc`, and concurrent first calls still build exactly one store.
#[derive(Debug)]
pub struct StoreCell<V> {
    cell: OnceLock<Arc<Store<V>>>,
}

impl<V> Default for StoreCell<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> StoreCell<V> {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    pub fn instance(&self) -> Arc<Store<V>> {
        Arc::clone(self.cell.get_or_init(|| {
            tracing::debug!("store constructed");
            Arc::new(Store::new())
        }))
    }
}
