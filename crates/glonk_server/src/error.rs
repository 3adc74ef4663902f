//! Error envelope returned by every route.
//!
//! Backend error text never reaches the caller; internal failures are logged
//! here and answered with a generic message.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use glonk_core::GlonkError;

/// `code` is stable and machine-readable; `message` is the generic status text.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub code: &'static str,
    pub message: &'static str,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: &'static str) -> Self {
        Self {
            status,
            code,
            message,
        }
    }

    pub fn bad_request() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", "Bad Request")
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", "Not Found")
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", "Not Authorized")
    }

    pub fn internal() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Internal Server Error",
        )
    }
}

impl From<GlonkError> for ApiError {
    fn from(err: GlonkError) -> Self {
        match err {
            GlonkError::NotFound { .. } => {
                tracing::debug!("{err}");
                Self::not_found()
            }
            GlonkError::Schema { .. }
            | GlonkError::Integrity { .. }
            | GlonkError::Decode { .. }
            | GlonkError::Storage { .. } => {
                tracing::error!("request failed: {err}");
                Self::internal()
            }
            GlonkError::Parse { .. }
            | GlonkError::Arity { .. }
            | GlonkError::InvalidInput { .. } => {
                tracing::debug!("rejected request: {err}");
                Self::bad_request()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}
