//! Shared error type across tally crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Requested key or route does not exist.
    NotFound,
    /// Invalid input / malformed config.
    BadRequest,
    /// Persisted state could not be used.
    StateUnavailable,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::StateUnavailable => "STATE_UNAVAILABLE",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, TallyError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("key not found: {0}")]
    KeyNotFound(String),
    #[error("state load failed: {0}")]
    StateLoad(String),
    #[error("invalid snapshot timestamp: {0}")]
    Timestamp(#[from] chrono::ParseError),
    #[error("serialize failed: {0}")]
    Serialize(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown route: {0}")]
    UnknownRoute(String),
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("handler failed: {0}")]
    Handler(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl TallyError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            TallyError::KeyNotFound(_) | TallyError::UnknownRoute(_) => ClientCode::NotFound,
            TallyError::BadConfig(_) => ClientCode::BadRequest,
            TallyError::StateLoad(_) | TallyError::Timestamp(_) => ClientCode::StateUnavailable,
            TallyError::Serialize(_)
            | TallyError::Io(_)
            | TallyError::Handler(_)
            | TallyError::Internal(_) => ClientCode::Internal,
        }
    }

    /// True for failures that recovery treats as "no usable snapshot".
    pub fn is_state_load(&self) -> bool {
        matches!(self, TallyError::StateLoad(_) | TallyError::Timestamp(_))
    }
}
