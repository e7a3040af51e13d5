//! HTTP mapping for `TallyError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use tally_core::error::TallyError;

/// Error returned from HTTP handlers.
///
/// View failures collapse to one generic 500; only unknown routes get their
/// own status.
#[derive(Debug)]
pub struct HttpError(pub TallyError);

impl From<TallyError> for HttpError {
    fn from(e: TallyError) -> Self {
        Self(e)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            TallyError::UnknownRoute(_) => (StatusCode::NOT_FOUND, self.0.client_code().as_str()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        };
        let message = status.canonical_reason().unwrap_or("error");
        let body = Json(json!({
            "error": code,
            "message": message,
        }));
        (status, body).into_response()
    }
}
