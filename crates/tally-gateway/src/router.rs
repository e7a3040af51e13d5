//! Axum router wiring.
//!
//! Operational routes are matched first; every other path goes through the
//! view pipeline, which answers 404 for unregistered routes.

use axum::{
    routing::{get, post},
    Router,
};

use crate::{app_state::AppState, ops, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(ops::healthz))
        .route("/readyz", get(ops::readyz))
        .route("/ops/flush", post(ops::flush))
        .fallback(transport::http::serve_view)
        .with_state(state)
}
