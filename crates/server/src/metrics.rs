//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus metrics recorder initialization
//! - Metric definitions (counters and gauges)
//! - Helper functions for recording metrics
//!
//! The helpers are plain functions so call sites stay greppable and the
//! metric names live in exactly one file.

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

use crate::registry::Feature;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// This should be called once at application startup, before any metrics
/// are recorded. Returns `true` if initialization succeeded, `false` if
/// already initialized.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        return false;
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("Failed to set global metrics recorder (already set)");
        return false;
    }

    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("Failed to store Prometheus handle (already set)");
    }

    describe_metrics();

    tracing::info!("Prometheus metrics initialized");
    true
}

/// Describe all application metrics for Prometheus.
fn describe_metrics() {
    describe_counter!(
        "hostdeck_transitions_total",
        "Display state transitions, by kind"
    );
    describe_counter!(
        "hostdeck_ticks_total",
        "Ticker wakeups processed, by feature"
    );
    describe_counter!(
        "hostdeck_tick_self_cancels_total",
        "Tickers that cancelled themselves, by feature and reason"
    );
    describe_counter!(
        "hostdeck_frames_sent_total",
        "Frames delivered to clients, by kind"
    );
    describe_counter!(
        "hostdeck_render_failures_total",
        "Surface renders that failed and were skipped"
    );

    describe_gauge!("hostdeck_sessions_active", "Sessions holding display state");
    describe_gauge!("hostdeck_connections_active", "Open WebSocket connections");
    describe_gauge!("hostdeck_tasks_live", "Live ticker tasks");
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

/// Record a display state transition, e.g. "open" or "minimize".
pub fn record_transition(kind: &'static str) {
    counter!("hostdeck_transitions_total", "kind" => kind).increment(1);
}

/// Record a ticker wakeup that passed the liveness check.
pub fn record_tick(feature: Feature) {
    counter!("hostdeck_ticks_total", "feature" => feature.as_str()).increment(1);
}

/// Record a ticker cancelling itself after finding its precondition gone.
pub fn record_self_cancel(feature: Feature, reason: &'static str) {
    counter!("hostdeck_tick_self_cancels_total", "feature" => feature.as_str(), "reason" => reason)
        .increment(1);
}

/// Record a frame delivered to a client.
pub fn record_frame(kind: &'static str) {
    counter!("hostdeck_frames_sent_total", "kind" => kind).increment(1);
}

/// Record a surface render that failed and was skipped.
pub fn record_render_failure() {
    counter!("hostdeck_render_failures_total").increment(1);
}

pub fn set_sessions_active(count: usize) {
    gauge!("hostdeck_sessions_active").set(count as f64);
}

pub fn set_connections_active(count: usize) {
    gauge!("hostdeck_connections_active").set(count as f64);
}

pub fn set_tasks_live(count: usize) {
    gauge!("hostdeck_tasks_live").set(count as f64);
}
