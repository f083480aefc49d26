//! Compile route.
//!
//! ## Routes
//!
//! - `POST /compile` - Compile source text with the external compiler
//!
//! The body is read raw and parsed here, so a malformed body always yields the
//! same `{"success": false, "error": "Invalid JSON"}` answer regardless of
//! content type.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use bridge_core::CompilationOutcome;

use crate::error::{ApiError, ApiResult};
use crate::server::{AppState, not_found};

/// Request to compile source text.
#[derive(Debug, Default)]
pub struct CompileRequest {
    /// Source text. Missing, null, non-string, and blank all mean "no code".
    pub code: Option<String>,
}

impl CompileRequest {
    /// Parses a request body.
    ///
    /// Any well-formed JSON is accepted; only a string `code` field carries
    /// source text.
    ///
    /// # Errors
    ///
    /// Returns a 400 error if the body is not valid JSON.
    pub fn from_slice(body: &[u8]) -> ApiResult<Self> {
        let value: Value = serde_json::from_slice(body).map_err(|_| ApiError::invalid_json())?;
        let code = value.get("code").and_then(Value::as_str).map(str::to_owned);
        Ok(Self { code })
    }
}

/// Creates compile routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/compile", post(compile).fallback(not_found))
}

/// Compile source text.
async fn compile(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Json<CompilationOutcome>> {
    let request = CompileRequest::from_slice(&body).inspect_err(|_| {
        tracing::info!(bytes = body.len(), "rejected unparseable compile request");
    })?;

    let outcome = state.gateway().compile(request.code.as_deref()).await?;
    Ok(Json(outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn parses_code() {
        let request = CompileRequest::from_slice(br#"{"code":"dhoro x = 10;"}"#).unwrap();
        assert_eq!(request.code.as_deref(), Some("dhoro x = 10;"));
    }

    #[test]
    fn missing_and_null_code_are_none() {
        assert!(CompileRequest::from_slice(b"{}").unwrap().code.is_none());
        assert!(CompileRequest::from_slice(br#"{"code":null}"#).unwrap().code.is_none());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let request = CompileRequest::from_slice(br#"{"code":"x","lang":"bn"}"#).unwrap();
        assert_eq!(request.code.as_deref(), Some("x"));
    }

    #[test]
    fn well_formed_bodies_without_string_code_are_none() {
        for body in [
            &br#"{"code": 42}"#[..],
            br#"{"code": false}"#,
            br#"{"code": {"text": "x"}}"#,
            br#"["dhoro x = 10;"]"#,
            br#""dhoro x = 10;""#,
            b"null",
            b"0",
        ] {
            let request = CompileRequest::from_slice(body).unwrap();
            assert!(request.code.is_none(), "{}", String::from_utf8_lossy(body));
        }
    }

    #[test]
    fn malformed_bodies_are_rejected() {
        for body in [&b"{not json"[..], b"", b"{\"code\": ", b"\xff\xfe"] {
            let err = CompileRequest::from_slice(body).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.message(), "Invalid JSON");
        }
    }
}
