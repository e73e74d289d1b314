//! Shared error type across gaugeboard crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed message.
    BadRequest,
    /// Referenced metric does not exist, or no metric is selected.
    NotFound,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GaugeboardError>;

/// Unified error type used by core and gateway.
///
/// Name collisions never appear here: the registry resolves them internally
/// by suffixing, so the public operations still succeed.
#[derive(Debug, Error)]
pub enum GaugeboardError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl GaugeboardError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            GaugeboardError::BadRequest(_) => ClientCode::BadRequest,
            GaugeboardError::NotFound(_) => ClientCode::NotFound,
            GaugeboardError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            GaugeboardError::Internal(_) => ClientCode::Internal,
        }
    }
}
