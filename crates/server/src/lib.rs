// crates/server/src/lib.rs
//! Hostdeck server library.
//!
//! This crate provides the Axum-based daemon behind hostdeck: session
//! surfaces over WebSocket, a small REST API for host status, and the
//! Prometheus exposition. Rendering itself lives in `hostdeck-core`;
//! this crate owns the sockets, the sampler, and the controller task.

pub mod config;
pub mod connections;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod registry;
pub mod routes;
pub mod sampler;
pub mod session;
pub mod state;

pub use error::*;
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (health, status, sessions, surface) plus /metrics
/// - CORS for development (allows any origin)
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Integration Tests
// ============================================================================
