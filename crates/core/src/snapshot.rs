// crates/core/src/snapshot.rs
//! Point-in-time metric snapshot types.
//!
//! A snapshot is taken fresh for every render and never cached across
//! ticks; staleness is therefore bounded by the tick cadence alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::estimate::SyntheticEstimate;

/// Three-bucket severity used to color gauges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Ok,
    Warn,
    Critical,
}

impl Severity {
    /// Processor buckets: calm below 50%, elevated below 80%.
    pub fn for_processor(load_pct: f64) -> Self {
        if load_pct < 50.0 {
            Severity::Ok
        } else if load_pct < 80.0 {
            Severity::Warn
        } else {
            Severity::Critical
        }
    }

    /// Memory buckets: calm below 60%, elevated below 85%.
    pub fn for_memory(used_pct: f64) -> Self {
        if used_pct < 60.0 {
            Severity::Ok
        } else if used_pct < 85.0 {
            Severity::Warn
        } else {
            Severity::Critical
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorMetrics {
    /// Global load percentage, sanitized to 0..=100.
    pub load_pct: f64,
    pub cores: usize,
    pub arch: String,
    pub load_avg_one: f64,
    pub load_avg_five: f64,
    pub load_avg_fifteen: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryMetrics {
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub total_bytes: u64,
}

impl MemoryMetrics {
    pub fn used_pct(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes as f64 / self.total_bytes as f64 * 100.0
    }
}

/// Connected sessions against the configured cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Population {
    pub current: usize,
    pub max: usize,
}

/// One entry in the module inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    pub name: String,
    pub version: String,
    pub authors: Vec<String>,
    pub description: String,
    pub enabled: bool,
    pub depends: Vec<String>,
    /// Absent for disabled modules.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub estimate: Option<SyntheticEstimate>,
}

/// Identity and uptime facts about the host and this daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostFacts {
    pub os_name: String,
    pub os_version: String,
    pub kernel: String,
    pub hostname: String,
    pub daemon_version: String,
    pub host_uptime_secs: u64,
    pub process_uptime_secs: u64,
}

/// Everything the renderer needs, read at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    pub processor: ProcessorMetrics,
    pub memory: MemoryMetrics,
    pub population: Population,
    pub modules: Vec<ModuleInfo>,
    pub host: HostFacts,
    pub sampled_at: DateTime<Utc>,
}

impl MetricSnapshot {
    pub fn enabled_module_count(&self) -> usize {
        self.modules.iter().filter(|m| m.enabled).count()
    }
}
