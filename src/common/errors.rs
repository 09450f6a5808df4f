use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use super::types::now_ms;

/// Failures reported by a [`crate::messaging::MessageTransport`].
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The message or channel no longer exists on the platform side.
    #[error("unknown message or channel")]
    NotFound,
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response: {0}")]
    Decode(String),
    /// Test transports use this to simulate an arbitrary rejection.
    #[error("transport rejected the call: {0}")]
    Rejected(String),
}

impl TransportError {
    /// True when the target is already gone, so a delete has nothing left to do
    /// and an edit must fall back to publishing a fresh message.
    pub fn is_gone(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

/// JSON error body returned by the HTTP command surface.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    pub status: u16,
    /// Reason phrase (e.g. "Not Found").
    pub error: String,
    pub message: String,
    /// The request path that caused the error.
    pub path: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            timestamp: now_ms(),
            status: status.as_u16(),
            error: status.canonical_reason().unwrap_or("Unknown").to_string(),
            message: message.into(),
            path: path.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, path)
    }

    pub fn not_found(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message, path)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}
