//! Metrics middleware and the Prometheus endpoint.
//!
//! Records request duration and throughput per route. Compile outcome metrics
//! live in [`bridge_core::metrics`] and are described here at startup.

use std::sync::OnceLock;
use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// ============================================================================
// Metric Names
// ============================================================================

/// HTTP request duration histogram.
pub const HTTP_REQUEST_DURATION: &str = "bridge_http_request_duration_seconds";

/// HTTP request counter.
pub const HTTP_REQUEST_TOTAL: &str = "bridge_http_requests_total";

const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Requests slower than this are logged. Compiles run up to the compiler
/// deadline, so the bar sits above the default 10 seconds.
const SLOW_REQUEST_SECS: f64 = 11.0;

// ============================================================================
// Prometheus Recorder
// ============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initializes the global metrics recorder with the Prometheus exporter.
///
/// Safe to call multiple times; subsequent calls are no-ops.
///
/// # Panics
///
/// Panics if the Prometheus recorder cannot be installed.
#[allow(clippy::panic)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .unwrap_or_else(|e| panic!("failed to install prometheus recorder: {e}"));

            describe_histogram!(HTTP_REQUEST_DURATION, "Duration of HTTP requests in seconds");
            describe_counter!(HTTP_REQUEST_TOTAL, "Total number of HTTP requests");
            bridge_core::metrics::register_metrics();

            tracing::info!("Prometheus metrics recorder initialized");
            handle
        })
        .clone()
}

/// Returns the global Prometheus handle, if initialized.
#[must_use]
pub fn prometheus_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// ============================================================================
// Metrics Middleware
// ============================================================================

pub(crate) fn endpoint_label<B>(request: &Request<B>) -> String {
    request.extensions().get::<MatchedPath>().map_or_else(
        || UNMATCHED_ENDPOINT.to_string(),
        |path| path.as_str().to_string(),
    )
}

/// Middleware that records request metrics.
///
/// Captures:
/// - `bridge_http_request_duration_seconds{endpoint, method, status_class}`
/// - `bridge_http_requests_total{endpoint, method, status_class}`
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let path = endpoint_label(&request);
    let method = request.method().to_string();

    let response = next.run(request).await;

    let duration = start.elapsed().as_secs_f64();
    let status_class = status_class(response.status());
    let labels = [
        ("endpoint", path.clone()),
        ("method", method.clone()),
        ("status_class", status_class.to_string()),
    ];

    histogram!(HTTP_REQUEST_DURATION, &labels).record(duration);
    counter!(HTTP_REQUEST_TOTAL, &labels).increment(1);

    if duration > SLOW_REQUEST_SECS {
        tracing::warn!(
            endpoint = %path,
            method = %method,
            status = response.status().as_u16(),
            duration_secs = %duration,
            "Slow request detected"
        );
    }

    response
}

/// Returns the status class (2xx, 3xx, 4xx, 5xx) for a status code.
fn status_class(status: StatusCode) -> &'static str {
    match status.as_u16() {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "unknown",
    }
}

// ============================================================================
// Metrics Endpoint
// ============================================================================

/// Handler for the `/metrics` endpoint.
pub async fn serve_metrics() -> impl IntoResponse {
    prometheus_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain; charset=utf-8")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; charset=utf-8")],
                handle.render(),
            )
        },
    )
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::routing::get;
    use tower::Service;

    #[test]
    fn test_status_class() {
        assert_eq!(status_class(StatusCode::OK), "2xx");
        assert_eq!(status_class(StatusCode::BAD_REQUEST), "4xx");
        assert_eq!(status_class(StatusCode::NOT_FOUND), "4xx");
        assert_eq!(status_class(StatusCode::INTERNAL_SERVER_ERROR), "5xx");
    }

    #[test]
    fn test_endpoint_label_unmatched() {
        let request = Request::builder().uri("/missing").body(Body::empty()).unwrap();
        assert_eq!(endpoint_label(&request), UNMATCHED_ENDPOINT);
    }

    #[tokio::test]
    async fn test_request_metrics_use_route_template() {
        let handle = init_metrics();
        let app = Router::new()
            .route("/items/:id", get(|| async { StatusCode::OK }))
            .route_layer(axum::middleware::from_fn(metrics_middleware));
        let request = Request::builder().uri("/items/123").body(Body::empty()).unwrap();
        let mut service = app.into_service::<Body>();
        let _response = service.call(request).await.unwrap();

        let metrics = handle.render();
        assert!(metrics
            .lines()
            .any(|line| line.starts_with(HTTP_REQUEST_TOTAL) && line.contains("endpoint=\"/items/:id\"")));
        assert!(!metrics.contains("endpoint=\"/items/123\""));
    }

    #[test]
    fn test_compile_metrics_render_after_init() {
        let handle = init_metrics();
        bridge_core::metrics::record_compile(
            bridge_core::OutcomeKind::EmptySource,
            std::time::Duration::from_millis(1),
        );
        let metrics = handle.render();
        assert!(metrics.contains("outcome=\"empty_source\""));
    }
}
