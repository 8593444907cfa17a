//! API route handlers for the hostdeck daemon.

pub mod health;
pub mod metrics;
pub mod sessions;
pub mod status;
pub mod surface;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET /api/health - Liveness check with version and uptime
/// - GET /api/status - Host metrics and daemon facts
/// - GET /api/sessions - Sessions currently holding display state
/// - GET /api/surface - WebSocket upgrade for the session surface
/// - GET /metrics - Prometheus exposition (no /api prefix)
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", status::router())
        .nest("/api", sessions::router())
        .nest("/api", surface::router())
        .merge(metrics::router())
        .with_state(state)
}
