//! Transport layer (HTTP).
//!
//! Exposes the per-request pipeline that wraps every registered view.

pub mod http;
