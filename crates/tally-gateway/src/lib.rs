//! tally gateway library entry.
//!
//! This crate wires the config, request context, view registry and HTTP
//! transport into a serving stack. It is intended to be consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod ops;
pub mod router;
pub mod transport;
pub mod views;
