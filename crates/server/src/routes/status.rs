//! Status endpoint: a REST view of the same snapshot the surfaces render.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use hostdeck_core::{format_bytes, format_uptime, MetricSnapshot, Severity};

use crate::state::AppState;

/// Response for GET /api/status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub version: String,
    pub hostname: String,
    pub os: String,
    pub kernel: String,
    pub arch: String,
    pub cpu_load_pct: f64,
    pub cpu_severity: Severity,
    pub cores: usize,
    pub memory_used: String,
    pub memory_total: String,
    pub memory_used_pct: f64,
    pub memory_severity: Severity,
    pub load_average: [f64; 3],
    pub sessions_connected: usize,
    pub sessions_limit: usize,
    pub modules_enabled: usize,
    pub modules_total: usize,
    pub host_uptime: String,
    pub daemon_uptime_secs: u64,
    pub started_at: DateTime<Utc>,
    pub sampled_at: DateTime<Utc>,
}

/// GET /api/status - Host metrics and daemon facts.
///
/// Takes a fresh sample; the numbers here match what a surface rendered
/// at the same moment would show.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let snap = state.sampler.sample();
    Json(build_status(&snap, state.uptime_secs(), state.started_at))
}

fn build_status(
    snap: &MetricSnapshot,
    daemon_uptime_secs: u64,
    started_at: DateTime<Utc>,
) -> StatusResponse {
    let memory_used_pct = snap.memory.used_pct();
    StatusResponse {
        version: snap.host.daemon_version.clone(),
        hostname: snap.host.hostname.clone(),
        os: format!("{} {}", snap.host.os_name, snap.host.os_version),
        kernel: snap.host.kernel.clone(),
        arch: snap.processor.arch.clone(),
        cpu_load_pct: snap.processor.load_pct,
        cpu_severity: Severity::for_processor(snap.processor.load_pct),
        cores: snap.processor.cores,
        memory_used: format_bytes(snap.memory.used_bytes),
        memory_total: format_bytes(snap.memory.total_bytes),
        memory_used_pct,
        memory_severity: Severity::for_memory(memory_used_pct),
        load_average: [
            snap.processor.load_avg_one,
            snap.processor.load_avg_five,
            snap.processor.load_avg_fifteen,
        ],
        sessions_connected: snap.population.current,
        sessions_limit: snap.population.max,
        modules_enabled: snap.enabled_module_count(),
        modules_total: snap.modules.len(),
        host_uptime: format_uptime(snap.host.host_uptime_secs),
        daemon_uptime_secs,
        started_at,
        sampled_at: snap.sampled_at,
    }
}

/// Create the status routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostdeck_core::{HostFacts, MemoryMetrics, Population, ProcessorMetrics};
    use pretty_assertions::assert_eq;

    fn snapshot() -> MetricSnapshot {
        MetricSnapshot {
            processor: ProcessorMetrics {
                load_pct: 82.0,
                cores: 4,
                arch: "aarch64".to_string(),
                load_avg_one: 1.5,
                load_avg_five: 1.2,
                load_avg_fifteen: 0.9,
            },
            memory: MemoryMetrics {
                used_bytes: 3 * 1024 * 1024 * 1024,
                free_bytes: 1024 * 1024 * 1024,
                total_bytes: 4 * 1024 * 1024 * 1024,
            },
            population: Population { current: 2, max: 64 },
            modules: vec![],
            host: HostFacts {
                os_name: "Debian".to_string(),
                os_version: "12".to_string(),
                kernel: "6.1.0".to_string(),
                hostname: "node-7".to_string(),
                daemon_version: "0.4.0".to_string(),
                host_uptime_secs: 3_660,
                process_uptime_secs: 60,
            },
            sampled_at: Utc::now(),
        }
    }

    #[test]
    fn build_status_formats_and_grades() {
        let status = build_status(&snapshot(), 60, Utc::now());
        assert_eq!(status.os, "Debian 12");
        assert_eq!(status.memory_used, "3 GB");
        assert_eq!(status.memory_total, "4 GB");
        assert_eq!(status.memory_used_pct, 75.0);
        assert_eq!(status.memory_severity, Severity::Warn);
        assert_eq!(status.cpu_severity, Severity::Critical);
        assert_eq!(status.host_uptime, "1h 1m");
        assert_eq!(status.load_average, [1.5, 1.2, 0.9]);
    }

    #[test]
    fn status_serializes_camel_case() {
        let status = build_status(&snapshot(), 60, Utc::now());
        let value = serde_json::to_value(&status).unwrap();
        assert!(value.get("cpuLoadPct").is_some());
        assert!(value.get("sessionsConnected").is_some());
        assert!(value.get("memoryUsedPct").is_some());
        assert_eq!(value["cpuSeverity"], "critical");
    }
}
