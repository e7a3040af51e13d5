//! Operational HTTP endpoints (not counted, not tracked).
//!
//! - `/healthz`    : liveness
//! - `/readyz`     : readiness (503 when draining)
//! - `/ops/flush`  : write the state snapshot now

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::app_state::AppState;
use crate::error::HttpError;

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    if state.is_draining() {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "draining" })))
    } else {
        (StatusCode::OK, Json(json!({ "status": "ready" })))
    }
}

pub async fn flush(State(state): State<AppState>) -> Response {
    let ctx = state.context();
    match ctx.flush() {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "flushed": ctx.persistence().path().display().to_string(),
                "rpm": ctx.rpm(),
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "explicit flush failed");
            HttpError(e).into_response()
        }
    }
}
