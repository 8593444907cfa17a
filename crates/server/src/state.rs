// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc::UnboundedSender;

use crate::config::ServerConfig;
use crate::connections::ConnectionRegistry;
use crate::controller::ControlEvent;
use crate::sampler::MetricSampler;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Resolved configuration the daemon started with.
    pub config: ServerConfig,
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Wall-clock start time, reported by `/api/status`.
    pub started_at: DateTime<Utc>,
    /// Live WebSocket connections and the session limit.
    pub connections: Arc<ConnectionRegistry>,
    /// Queue into the display controller task.
    pub control_tx: UnboundedSender<ControlEvent>,
    /// Host metric source shared with the controller.
    pub sampler: Arc<MetricSampler>,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(
        config: ServerConfig,
        connections: Arc<ConnectionRegistry>,
        control_tx: UnboundedSender<ControlEvent>,
        sampler: Arc<MetricSampler>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            start_time: Instant::now(),
            started_at: Utc::now(),
            connections,
            control_tx,
            sampler,
        })
    }

    /// Get the server uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
