//! Banner and health routes.
//!
//! ## Routes
//!
//! - `ANY /` - Plain-text banner naming the listening port
//! - `ANY /health` - Compiler availability
//!
//! Both answer every method; neither touches the scratch area.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::any;
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::server::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Always `"OK"` while the process is serving.
    pub status: String,
    /// Listening port.
    pub port: u16,
    /// Whether the compiler executable exists right now.
    pub compiler_exists: bool,
    /// Check time, RFC 3339 with millisecond precision.
    pub timestamp: String,
}

/// Creates banner and health routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", any(banner))
        .route("/health", any(health))
}

/// Plain-text banner.
async fn banner(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    format!("Bangla Compiler Backend Running on Port {}", state.config.http_port)
}

/// Compiler availability. The executable is looked up on every call.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        port: state.config.http_port,
        compiler_exists: state.gateway().compiler_exists(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
