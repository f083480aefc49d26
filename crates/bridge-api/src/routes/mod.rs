//! HTTP route handlers.

pub mod compile;
pub mod status;

use std::sync::Arc;

use axum::Router;

use crate::server::AppState;

/// All gateway routes.
pub fn gateway_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(status::routes())
        .merge(compile::routes())
}
