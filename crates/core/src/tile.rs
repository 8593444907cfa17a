// crates/core/src/tile.rs
//! Tiles: the unit of surface content.

use serde::{Deserialize, Serialize};

use crate::snapshot::Severity;

/// What a tile is, independent of where it sits. Click events echo the
/// kind back, so dispatch never has to guess from labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// Border and background filler. Inert.
    Filler,
    Minimize,
    Resize,
    OverlayToggle,
    AutoRefreshToggle,
    CloseButton,
    Restore,
    Refresh,
    ProcessorGauge,
    MemoryGauge,
    PopulationGauge,
    HostInfo,
    PerformanceGauge,
    SystemInfo,
    ModuleSummary,
    ModuleEntry,
    Back,
}

/// One rendered tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub kind: TileKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub severity: Option<Severity>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub lines: Vec<String>,
}

impl Tile {
    pub fn new(kind: TileKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            severity: None,
            lines: Vec::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }
}

/// A tile pinned to a slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotTile {
    pub slot: usize,
    #[serde(flatten)]
    pub tile: Tile,
}
