//! Per-request pipeline for registered views.
//!
//! For every request to a known route:
//! - count it in the rate counter
//! - run the view against the shared context
//! - on success, feed the elapsed time into the route's stats bucket
//! - on failure, flush state to disk, then answer a generic 500

use axum::{extract::State, http::Uri, response::IntoResponse, response::Response, Json};
use tokio::time::Instant;

use tally_core::error::TallyError;

use crate::app_state::AppState;
use crate::error::HttpError;

pub async fn serve_view(State(app): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    let Some(view) = app.views().get(path) else {
        return HttpError(TallyError::UnknownRoute(path.to_string())).into_response();
    };

    let ctx = app.context();
    ctx.hit();

    let start = Instant::now();
    match view.handle(&ctx).await {
        Ok(body) => {
            let elapsed = start.elapsed();
            if let Err(e) = ctx.stats().record(path, elapsed) {
                tracing::warn!(route = %path, error = %e, "stats not recorded");
            }
            Json(body).into_response()
        }
        Err(e) => {
            tracing::error!(route = %path, error = %e, "view failed");
            if let Err(flush_err) = ctx.flush() {
                tracing::warn!(error = %flush_err, "state flush after view failure failed");
            }
            HttpError(e).into_response()
        }
    }
}
