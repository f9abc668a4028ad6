//! server::error
//!
//! Request-level errors and their JSON responses.
//!
//! Only request-shape problems reach here. Per-repository failures are data
//! inside a 200 response and never become an `ApiError`.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, warn};

/// Errors that fail a whole request.
///
/// Every variant renders as `{"error": "<message>"}` with
/// `Content-Type: application/json` and no caching headers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The route exists but not for this method.
    #[error("Method not allowed")]
    MethodNotAllowed {
        /// Value for the `Allow` header
        allow: &'static str,
    },

    /// The request is missing something or has the wrong shape.
    #[error("{0}")]
    BadRequest(String),

    /// The request body exceeds the server's limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Anything else, including an unparsable request body.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));

        match self {
            ApiError::MethodNotAllowed { allow } => {
                debug!(%status, allow, "method not allowed");
                (status, [(header::ALLOW, allow)], body).into_response()
            }
            ApiError::BadRequest(msg) | ApiError::PayloadTooLarge(msg) => {
                warn!(%status, error = %msg, "rejected request");
                (status, body).into_response()
            }
            ApiError::Internal(msg) => {
                error!(%status, error = %msg, "internal server error");
                (status, body).into_response()
            }
        }
    }
}
