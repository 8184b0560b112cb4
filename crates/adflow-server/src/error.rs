use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use adflow_store::StoreError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Transport-boundary error taxonomy. Pipeline failures never surface here:
/// they degrade to `{ is_complete: true, error }` on the polled response
/// instead of an HTTP failure.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Session not found. Please create a new session.")]
    SessionNotFound,

    #[error("Response not found: {0}")]
    ResponseNotFound(String),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::SessionNotFound | Self::ResponseNotFound(_) | Self::AssetNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse { error: self.to_string() });
        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::SessionNotFound(_) => Self::SessionNotFound,
            StoreError::AssetNotFound(asset_ref) => Self::AssetNotFound(asset_ref),
            StoreError::Io(e) => Self::Internal(e.to_string()),
        }
    }
}
