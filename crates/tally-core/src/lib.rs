//! tally core: the shared state container, route statistics, snapshot format
//! and error types.
//!
//! This crate carries no transport or runtime dependencies; the gateway owns
//! the listener, the reset loop and file I/O, and talks to the state only
//! through the types defined here.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Expected failures (missing keys, corrupt snapshots) surface as
//! `TallyError`/`Result` instead.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod snapshot;
pub mod stats;
pub mod store;

/// Shared result type.
pub use error::{Result, TallyError};
pub use snapshot::{PersistedSnapshot, ResumePlan, RATE_WINDOW_SECS};
pub use stats::{RouteBucket, StatsTracker, STATS_WINDOW};
pub use store::{Store, StoreCell};
