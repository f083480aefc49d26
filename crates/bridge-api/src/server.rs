//! API server implementation.
//!
//! Wires the compile gateway into an axum router with CORS, tracing, and
//! request metrics.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{DefaultBodyLimit, Request};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use bridge_core::{CompileGateway, Result};

use crate::config::{Config, CorsConfig};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for all request handlers.
#[derive(Debug)]
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    gateway: Arc<CompileGateway>,
}

impl AppState {
    /// Creates application state around an existing gateway.
    #[must_use]
    pub fn new(config: Config, gateway: Arc<CompileGateway>) -> Self {
        Self { config, gateway }
    }

    /// Returns the compile gateway.
    #[must_use]
    pub fn gateway(&self) -> &CompileGateway {
        &self.gateway
    }
}

// ============================================================================
// Fallbacks
// ============================================================================

/// Plain-text 404 for unknown paths and unsupported methods.
pub(crate) async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

/// Answers any OPTIONS request that CORS did not treat as a preflight.
async fn options_middleware(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

// ============================================================================
// Server
// ============================================================================

/// The compile gateway HTTP server.
#[derive(Debug)]
pub struct Server {
    config: Config,
    gateway: Arc<CompileGateway>,
}

impl Server {
    /// Creates a new server, building its gateway from `config`.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let gateway = Arc::new(CompileGateway::new(config.gateway_settings()));
        Self { config, gateway }
    }

    /// Creates a new `ServerBuilder`.
    #[must_use]
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the compile gateway.
    #[must_use]
    pub fn gateway(&self) -> &Arc<CompileGateway> {
        &self.gateway
    }

    /// Creates the router with all routes and middleware.
    fn create_router(&self) -> Router {
        let state = Arc::new(AppState::new(self.config.clone(), Arc::clone(&self.gateway)));

        let mut router = crate::routes::gateway_routes();
        if self.config.metrics_enabled {
            router = router.route("/metrics", get(crate::metrics::serve_metrics));
        }

        router
            .fallback(not_found)
            .layer(DefaultBodyLimit::max(self.config.max_body_bytes))
            // Middleware (order matters): metrics outermost for timing, then
            // trace, then CORS, then the OPTIONS catch-all inside CORS so its
            // responses still carry CORS headers.
            .layer(middleware::from_fn(options_middleware))
            .layer(self.build_cors_layer())
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(crate::metrics::metrics_middleware))
            .with_state(state)
    }

    /// Builds the CORS layer from configuration.
    fn build_cors_layer(&self) -> CorsLayer {
        let cors_config = &self.config.cors;
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
            .max_age(Duration::from_secs(cors_config.max_age_seconds));
        Self::apply_cors_allowed_origins(cors, cors_config)
    }

    fn cors_allows_any_origin(cors_config: &CorsConfig) -> bool {
        cors_config.allowed_origins.len() == 1
            && cors_config
                .allowed_origins
                .first()
                .is_some_and(|origin| origin == "*")
    }

    fn parse_cors_origins(cors_config: &CorsConfig) -> Vec<HeaderValue> {
        let mut allowed = Vec::new();
        for origin in &cors_config.allowed_origins {
            match HeaderValue::from_str(origin) {
                Ok(value) => allowed.push(value),
                Err(_) => {
                    tracing::error!(
                        origin = %origin,
                        "Invalid CORS origin; expected a valid HeaderValue"
                    );
                }
            }
        }
        allowed
    }

    fn apply_cors_allowed_origins(cors: CorsLayer, cors_config: &CorsConfig) -> CorsLayer {
        if cors_config.allowed_origins.is_empty() {
            return cors;
        }

        if Self::cors_allows_any_origin(cors_config) {
            return cors.allow_origin(Any);
        }

        if cors_config.allowed_origins.iter().any(|origin| origin == "*") {
            tracing::error!(
                origins = ?cors_config.allowed_origins,
                "Invalid CORS config: '*' must be the only allowed origin"
            );
            return cors;
        }

        let allowed = Self::parse_cors_origins(cors_config);
        if allowed.is_empty() {
            tracing::warn!("All configured CORS origins were invalid; disabling CORS");
            cors
        } else {
            tracing::info!(origins = ?cors_config.allowed_origins, "CORS configured");
            cors.allow_origin(AllowOrigin::list(allowed))
        }
    }

    /// Prepares the scratch area and serves until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns an error if the scratch root cannot be created or the server
    /// cannot bind to its port.
    pub async fn serve(&self) -> Result<()> {
        self.gateway.prepare()?;

        if self.config.metrics_enabled {
            crate::metrics::init_metrics();
        }

        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let router = self.create_router();

        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!(port = self.config.http_port, "port is already in use");
            }
            bridge_core::Error::internal(format!("failed to bind to {addr}: {e}"))
        })?;

        let settings = self.gateway.settings();
        tracing::info!(
            http_port = self.config.http_port,
            compiler = %settings.compiler.display(),
            scratch_dir = %settings.scratch_dir.display(),
            isolation = %settings.isolation,
            timeout_secs = settings.timeout.as_secs(),
            "Compile gateway ready for requests"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| bridge_core::Error::internal(format!("server error: {e}")))?;

        tracing::info!("Compile gateway stopped");
        Ok(())
    }

    /// Creates a test router for the server.
    ///
    /// Useful for integration tests that exercise routes without binding a
    /// port. Does not create the scratch root; call
    /// [`CompileGateway::prepare`] first if the test needs it.
    #[doc(hidden)]
    pub fn test_router(&self) -> Router {
        self.create_router()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Builder for constructing a server.
#[derive(Debug, Default)]
pub struct ServerBuilder {
    config: Config,
}

impl ServerBuilder {
    /// Creates a new server builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Sets the HTTP port.
    #[must_use]
    pub fn http_port(mut self, port: u16) -> Self {
        self.config.http_port = port;
        self
    }

    /// Sets the deployment directory.
    #[must_use]
    pub fn deploy_dir(mut self, dir: impl Into<std::path::PathBuf>) -> Self {
        self.config.deploy_dir = dir.into();
        self
    }

    /// Sets the compiler program and its arguments.
    #[must_use]
    pub fn compiler(mut self, program: impl Into<std::path::PathBuf>, args: Vec<String>) -> Self {
        self.config.compiler_path = Some(program.into());
        self.config.compiler_args = args;
        self
    }

    /// Sets the compiler deadline in seconds.
    #[must_use]
    pub fn compile_timeout_secs(mut self, secs: u64) -> Self {
        self.config.compile_timeout_secs = secs;
        self
    }

    /// Sets the artifact isolation mode.
    #[must_use]
    pub fn artifact_isolation(mut self, isolation: bridge_core::ArtifactIsolation) -> Self {
        self.config.artifact_isolation = isolation;
        self
    }

    /// Mounts the `/metrics` endpoint.
    #[must_use]
    pub fn metrics_enabled(mut self, enabled: bool) -> Self {
        self.config.metrics_enabled = enabled;
        self
    }

    /// Sets the request body limit.
    #[must_use]
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.config.max_body_bytes = limit;
        self
    }

    /// Builds the server.
    #[must_use]
    pub fn build(self) -> Server {
        Server::new(self.config)
    }
}

// ============================================================================
// Tests
// ============================================================================
