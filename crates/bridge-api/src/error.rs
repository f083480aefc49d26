//! API error types and HTTP response mapping.
//!
//! Compiler-domain failures never reach this module; they are
//! [`CompilationOutcome`](bridge_core::CompilationOutcome)s served with 200.
//! `ApiError` covers the remaining cases: an unreadable request (400) and an
//! orchestration fault (500).

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use bridge_core::Error as CoreError;

/// API result type.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error body for 400 responses.
pub const INVALID_JSON: &str = "Invalid JSON";

/// `output` text carried by 500 responses.
pub const SERVER_ERROR_OUTPUT: &str = "Server error";

/// 400 response body.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct BadRequestBody {
    /// Always false.
    pub success: bool,
    /// Error text.
    pub error: String,
}

/// 500 response body. Shaped like a failed compilation so clients can render
/// it with the same code path.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ServerErrorBody {
    /// Always false.
    pub success: bool,
    /// Error text.
    pub error: String,
    /// Always empty.
    pub assembly: String,
    /// Always [`SERVER_ERROR_OUTPUT`].
    pub output: String,
    /// Always zero.
    pub keywords: u64,
    /// Always zero.
    pub identifiers: u64,
}

/// HTTP API error.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Returns an error response for an unreadable request body.
    #[must_use]
    pub fn invalid_json() -> Self {
        Self::bad_request(INVALID_JSON)
    }

    /// Returns an error response for invalid input.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Returns an internal error response.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the human-readable error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            (
                self.status,
                Json(ServerErrorBody {
                    success: false,
                    error: self.message,
                    assembly: String::new(),
                    output: SERVER_ERROR_OUTPUT.to_string(),
                    keywords: 0,
                    identifiers: 0,
                }),
            )
                .into_response()
        } else {
            (
                self.status,
                Json(BadRequestBody {
                    success: false,
                    error: self.message,
                }),
            )
                .into_response()
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidInput(message) => Self::bad_request(message),
            CoreError::Io { .. } => Self::internal(value.to_string()),
            CoreError::Internal { message } => Self::internal(message),
        }
    }
}
