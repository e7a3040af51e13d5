//! View registry.
//!
//! Re-exports the registry and the `View` trait so downstream consumers can
//! depend on this module directly.

pub mod registry;

pub use registry::{View, ViewRegistry};
