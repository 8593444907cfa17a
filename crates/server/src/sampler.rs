// crates/server/src/sampler.rs
//! Host metric collection.
//!
//! One [`MetricSampler`] is shared by every renderer and REST handler; it
//! owns the `sysinfo::System` behind a mutex because sysinfo refreshes
//! mutate in place. Sampling is cheap (two refresh calls plus reads), so
//! callers just take a fresh [`MetricSnapshot`] whenever they paint.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

use hostdeck_core::{
    synthetic_estimate, HostFacts, MemoryMetrics, MetricSnapshot, ModuleInfo, Population,
    ProcessorMetrics,
};

use crate::connections::ConnectionRegistry;

struct ModuleSpec {
    name: &'static str,
    description: &'static str,
    depends: &'static [&'static str],
}

/// The daemon's own collectors, reported as its module inventory.
const MODULES: &[ModuleSpec] = &[
    ModuleSpec {
        name: "processor",
        description: "CPU load sampling and severity grading",
        depends: &[],
    },
    ModuleSpec {
        name: "memory",
        description: "Memory usage sampling and severity grading",
        depends: &[],
    },
    ModuleSpec {
        name: "population",
        description: "Connected session census",
        depends: &[],
    },
    ModuleSpec {
        name: "inventory",
        description: "Host, kernel and uptime fact collection",
        depends: &[],
    },
    ModuleSpec {
        name: "surface",
        description: "Slot grid rendering for dashboard surfaces",
        depends: &["processor", "memory", "population"],
    },
    ModuleSpec {
        name: "overlay",
        description: "One-line hands-free metric readout",
        depends: &["processor", "memory"],
    },
    ModuleSpec {
        name: "auto-refresh",
        description: "Periodic in-place surface patching",
        depends: &["surface"],
    },
];

pub struct MetricSampler {
    system: Mutex<System>,
    rng: Mutex<StdRng>,
    connections: Arc<ConnectionRegistry>,
    disabled_modules: Vec<String>,
    process_start: Instant,
}

impl MetricSampler {
    pub fn new(connections: Arc<ConnectionRegistry>, disabled_modules: Vec<String>) -> Self {
        let system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::everything())
                .with_memory(MemoryRefreshKind::everything()),
        );
        Self {
            system: Mutex::new(system),
            rng: Mutex::new(StdRng::from_entropy()),
            connections,
            disabled_modules,
            process_start: Instant::now(),
        }
    }

    /// Prime the CPU counters. The first usage reading needs two refreshes
    /// spaced by sysinfo's minimum interval; without this the first
    /// rendered surface shows 0% CPU.
    pub async fn warm_up(&self) {
        {
            let mut system = self.lock_system();
            system.refresh_cpu_usage();
        }
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
        let mut system = self.lock_system();
        system.refresh_cpu_usage();
    }

    /// Take a fresh snapshot of everything the surfaces display.
    pub fn sample(&self) -> MetricSnapshot {
        let (processor, memory) = {
            let mut system = self.lock_system();
            system.refresh_cpu_usage();
            system.refresh_memory();

            let raw = system.global_cpu_usage() as f64;
            let load_pct = if raw.is_finite() {
                raw.clamp(0.0, 100.0)
            } else {
                0.0
            };
            let load = System::load_average();
            let processor = ProcessorMetrics {
                load_pct,
                cores: system.cpus().len(),
                arch: System::cpu_arch(),
                load_avg_one: load.one,
                load_avg_five: load.five,
                load_avg_fifteen: load.fifteen,
            };

            let total = system.total_memory();
            let used = system.used_memory();
            let memory = MemoryMetrics {
                used_bytes: used,
                free_bytes: total.saturating_sub(used),
                total_bytes: total,
            };
            (processor, memory)
        };

        MetricSnapshot {
            processor,
            memory,
            population: Population {
                current: self.connections.count(),
                max: self.connections.limit(),
            },
            modules: self.modules(),
            host: self.host_facts(),
            sampled_at: Utc::now(),
        }
    }

    fn modules(&self) -> Vec<ModuleInfo> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        MODULES
            .iter()
            .map(|spec| {
                let enabled = !self
                    .disabled_modules
                    .iter()
                    .any(|d| d.eq_ignore_ascii_case(spec.name));
                ModuleInfo {
                    name: spec.name.to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                    authors: vec!["hostdeck developers".to_string()],
                    description: spec.description.to_string(),
                    enabled,
                    depends: spec.depends.iter().map(|d| d.to_string()).collect(),
                    estimate: enabled.then(|| synthetic_estimate(spec.depends.len(), &mut *rng)),
                }
            })
            .collect()
    }

    fn host_facts(&self) -> HostFacts {
        let unknown = || "unknown".to_string();
        HostFacts {
            os_name: System::name().unwrap_or_else(unknown),
            os_version: System::os_version().unwrap_or_else(unknown),
            kernel: System::kernel_version().unwrap_or_else(unknown),
            hostname: System::host_name().unwrap_or_else(unknown),
            daemon_version: env!("CARGO_PKG_VERSION").to_string(),
            host_uptime_secs: System::uptime(),
            process_uptime_secs: self.process_start.elapsed().as_secs(),
        }
    }

    fn lock_system(&self) -> std::sync::MutexGuard<'_, System> {
        self.system.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
