use std::time::Duration;

/// Typed error hierarchy for generation-backend calls.
///
/// The engine never retries: a failed completion surfaces to the caller
/// verbatim, wrapped in the failing stage's error when it happens inside a
/// pipeline.
#[derive(Clone, Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend unavailable ({status}): {body}")]
    Unavailable { status: u16, body: String },
    #[error("backend rejected request: {0}")]
    Rejected(String),
    #[error("network error: {0}")]
    NetworkError(String),
    #[error("timeout after {0:?}")]
    Timeout(Duration),
    #[error("cancelled")]
    Cancelled,
}

impl BackendError {
    /// Short classification string for logging/metrics.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "unavailable",
            Self::Rejected(_) => "rejected",
            Self::NetworkError(_) => "network_error",
            Self::Timeout(_) => "timeout",
            Self::Cancelled => "cancelled",
        }
    }

    /// Classify an HTTP status code into the appropriate error variant.
    ///
    /// Rate limiting and server-side failures mean the backend is
    /// unavailable; any other client error is a rejection of the request
    /// itself (malformed input, content policy).
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            429 | 500..=599 => Self::Unavailable { status, body },
            400..=499 => Self::Rejected(body),
            _ => Self::Rejected(format!("unexpected status {status}: {body}")),
        }
    }
}
