// crates/core/src/render.rs
//! Surface rendering: snapshot and layout in, tile grid out.
//!
//! Everything here is a pure function of its inputs. Stateful concerns
//! (which session sees which surface, when to repaint) belong to the
//! caller; this module only knows where tiles go and what they say.
//!
//! Slot numbering is row-major over 9-slot rows. The control row is row
//! zero on every dashboard size, so muscle memory survives a resize.

use serde::{Deserialize, Serialize};

use crate::error::RenderError;
use crate::format::{format_bytes, format_decimal, format_uptime, progress_bar};
use crate::layout::LayoutSize;
use crate::snapshot::{MetricSnapshot, ModuleInfo, Severity};
use crate::tile::{SlotTile, Tile, TileKind};

pub const DASHBOARD_TITLE: &str = "Hostdeck Monitor";
pub const MINIMIZED_TITLE: &str = "Hostdeck (minimized)";
pub const MODULES_TITLE: &str = "Module Details";

/// Notice attached to auto-refresh patches.
pub const DATA_UPDATED_NOTICE: &str = "Data updated";

// Control row slots, identical across dashboard sizes.
pub const SLOT_MINIMIZE: usize = 1;
pub const SLOT_RESIZE: usize = 2;
pub const SLOT_OVERLAY: usize = 4;
pub const SLOT_AUTO_REFRESH: usize = 6;
pub const SLOT_CLOSE: usize = 7;

/// The module view is always rendered at the largest capacity.
const MODULE_VIEW_CAPACITY: usize = 54;
const MODULE_ENTRY_LIMIT: usize = 45;
const SLOT_BACK: usize = 53;

const MINIMIZED_CAPACITY: usize = 9;
const DESCRIPTION_LIMIT: usize = 40;

/// A full rendered surface: a titled, fixed-capacity slot grid. Tiles are
/// sorted by slot; slots not listed are empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceFrame {
    pub title: String,
    pub capacity: usize,
    pub tiles: Vec<SlotTile>,
}

impl SurfaceFrame {
    fn new(title: impl Into<String>, capacity: usize) -> Self {
        Self {
            title: title.into(),
            capacity,
            tiles: Vec::new(),
        }
    }

    /// Place a tile. A slot beyond capacity is a bug in a layout table and
    /// is surfaced instead of silently dropped.
    fn place(&mut self, slot: usize, tile: Tile) -> Result<(), RenderError> {
        if slot >= self.capacity {
            return Err(RenderError::slot_out_of_range(slot, self.capacity));
        }
        self.tiles.push(SlotTile { slot, tile });
        Ok(())
    }

    fn occupied(&self, slot: usize) -> bool {
        self.tiles.iter().any(|t| t.slot == slot)
    }

    fn finish(mut self) -> Self {
        self.tiles.sort_by_key(|t| t.slot);
        self
    }
}

/// Data tile placement for a dashboard layout.
///
/// The compact layout keeps only the three headline tiles; medium and
/// large share one table (the extra row of a large surface is breathing
/// room, not new content).
fn data_slots(size: LayoutSize) -> &'static [(usize, TileKind)] {
    match size {
        LayoutSize::Full => &[
            (11, TileKind::ProcessorGauge),
            (13, TileKind::MemoryGauge),
            (15, TileKind::HostInfo),
            (29, TileKind::PerformanceGauge),
            (31, TileKind::ModuleSummary),
            (33, TileKind::SystemInfo),
        ],
        LayoutSize::Medium | LayoutSize::Large => &[
            (10, TileKind::ProcessorGauge),
            (12, TileKind::MemoryGauge),
            (14, TileKind::HostInfo),
            (19, TileKind::ModuleSummary),
            (21, TileKind::PerformanceGauge),
            (23, TileKind::SystemInfo),
        ],
        LayoutSize::Compact => &[
            (10, TileKind::ProcessorGauge),
            (12, TileKind::MemoryGauge),
            (14, TileKind::ModuleSummary),
        ],
    }
}

fn refresh_slot(size: LayoutSize) -> usize {
    match size {
        LayoutSize::Full => 49,
        LayoutSize::Medium | LayoutSize::Large => 31,
        LayoutSize::Compact => 22,
    }
}

/// Render the dashboard at `size`.
pub fn dashboard(
    size: LayoutSize,
    auto_refresh_on: bool,
    snap: &MetricSnapshot,
) -> Result<SurfaceFrame, RenderError> {
    let mut frame = SurfaceFrame::new(DASHBOARD_TITLE, size.slot_count());

    frame.place(SLOT_MINIMIZE, Tile::new(TileKind::Minimize, "Minimize"))?;
    frame.place(
        SLOT_RESIZE,
        Tile::new(TileKind::Resize, "Resize")
            .line(format!("Current: {} slots", size.slot_count()))
            .line("Cycle: 27 → 36 → 45 → 54 → 27"),
    )?;
    frame.place(
        SLOT_OVERLAY,
        Tile::new(TileKind::OverlayToggle, "Overlay").line("Hands-free readout"),
    )?;
    frame.place(SLOT_AUTO_REFRESH, auto_refresh_tile(auto_refresh_on))?;
    frame.place(SLOT_CLOSE, Tile::new(TileKind::CloseButton, "Close"))?;

    for &(slot, kind) in data_slots(size) {
        frame.place(slot, data_tile(kind, snap))?;
    }
    frame.place(
        refresh_slot(size),
        Tile::new(TileKind::Refresh, "Refresh").line("Update now"),
    )?;

    add_border(&mut frame)?;
    Ok(frame.finish())
}

/// Render the minimized strip. Always nine slots, whatever the session's
/// layout size.
pub fn minimized(snap: &MetricSnapshot) -> Result<SurfaceFrame, RenderError> {
    let mut frame = SurfaceFrame::new(MINIMIZED_TITLE, MINIMIZED_CAPACITY);
    frame.place(
        0,
        Tile::new(TileKind::Restore, "Restore").line("Reopen the dashboard"),
    )?;

    let load = snap.processor.load_pct;
    frame.place(
        2,
        Tile::new(TileKind::ProcessorGauge, "CPU")
            .with_severity(Severity::for_processor(load))
            .line(format!("{}%", format_decimal(load))),
    )?;

    let mem_pct = snap.memory.used_pct();
    frame.place(
        4,
        Tile::new(TileKind::MemoryGauge, "Memory")
            .with_severity(Severity::for_memory(mem_pct))
            .line(format!("{}%", format_decimal(mem_pct))),
    )?;

    frame.place(
        6,
        Tile::new(TileKind::PopulationGauge, "Sessions").line(format!(
            "{} / {}",
            snap.population.current, snap.population.max
        )),
    )?;
    frame.place(8, Tile::new(TileKind::CloseButton, "Close"))?;
    Ok(frame.finish())
}

/// Render the module detail view.
pub fn modules(snap: &MetricSnapshot) -> Result<SurfaceFrame, RenderError> {
    let mut frame = SurfaceFrame::new(MODULES_TITLE, MODULE_VIEW_CAPACITY);
    for (slot, module) in snap.modules.iter().take(MODULE_ENTRY_LIMIT).enumerate() {
        frame.place(slot, module_entry_tile(module))?;
    }
    frame.place(
        SLOT_BACK,
        Tile::new(TileKind::Back, "Back").line("Return to dashboard"),
    )?;
    Ok(frame.finish())
}

/// The data tiles only, for an auto-refresh patch. Controls, the refresh
/// button, and filler are deliberately untouched so a patch can never
/// move or repaint the parts of the surface the user is aiming at.
pub fn data_patch(size: LayoutSize, snap: &MetricSnapshot) -> Vec<SlotTile> {
    data_slots(size)
        .iter()
        .map(|&(slot, kind)| SlotTile {
            slot,
            tile: data_tile(kind, snap),
        })
        .collect()
}

/// The auto-refresh toggle in its current state, for single-slot patches.
pub fn auto_refresh_tile(on: bool) -> Tile {
    if on {
        Tile::new(TileKind::AutoRefreshToggle, "Auto-refresh: ON").line("Click to stop")
    } else {
        Tile::new(TileKind::AutoRefreshToggle, "Auto-refresh: OFF").line("Click to start")
    }
}

/// The one-line overlay readout.
pub fn overlay_line(snap: &MetricSnapshot) -> String {
    format!(
        "[HD] CPU: {}% | RAM: {}% | Sessions: {} | hostdeck",
        format_decimal(snap.processor.load_pct),
        format_decimal(snap.memory.used_pct()),
        snap.population.current
    )
}

fn data_tile(kind: TileKind, snap: &MetricSnapshot) -> Tile {
    match kind {
        TileKind::ProcessorGauge => processor_tile(snap),
        TileKind::MemoryGauge => memory_tile(snap),
        TileKind::HostInfo => host_tile(snap),
        TileKind::PerformanceGauge => performance_tile(snap),
        TileKind::ModuleSummary => module_summary_tile(snap),
        TileKind::SystemInfo => system_info_tile(snap),
        // layout tables only list the kinds above
        other => Tile::new(other, ""),
    }
}

fn processor_tile(snap: &MetricSnapshot) -> Tile {
    let load = snap.processor.load_pct;
    Tile::new(TileKind::ProcessorGauge, "Processor")
        .with_severity(Severity::for_processor(load))
        .line(format!("Load: {}%", format_decimal(load)))
        .line(progress_bar(load))
        .line(format!("Cores: {}", snap.processor.cores))
}

fn memory_tile(snap: &MetricSnapshot) -> Tile {
    let pct = snap.memory.used_pct();
    Tile::new(TileKind::MemoryGauge, "Memory")
        .with_severity(Severity::for_memory(pct))
        .line(format!(
            "Used: {} / {}",
            format_bytes(snap.memory.used_bytes),
            format_bytes(snap.memory.total_bytes)
        ))
        .line(progress_bar(pct))
        .line(format!(
            "{}% used, {} free",
            format_decimal(pct),
            format_bytes(snap.memory.free_bytes)
        ))
}

fn host_tile(snap: &MetricSnapshot) -> Tile {
    Tile::new(TileKind::HostInfo, "Host")
        .line(format!(
            "Sessions: {} / {}",
            snap.population.current, snap.population.max
        ))
        .line(format!(
            "Uptime: {}",
            format_uptime(snap.host.process_uptime_secs)
        ))
        .line(format!("hostdeck v{}", snap.host.daemon_version))
}

fn performance_tile(snap: &MetricSnapshot) -> Tile {
    Tile::new(TileKind::PerformanceGauge, "Performance")
        .line(format!(
            "Load avg 1m: {}",
            format_decimal(snap.processor.load_avg_one)
        ))
        .line(format!(
            "Load avg 5m: {}",
            format_decimal(snap.processor.load_avg_five)
        ))
        .line(format!(
            "Load avg 15m: {}",
            format_decimal(snap.processor.load_avg_fifteen)
        ))
}

fn module_summary_tile(snap: &MetricSnapshot) -> Tile {
    Tile::new(TileKind::ModuleSummary, "Modules")
        .line(format!(
            "{} enabled / {} total",
            snap.enabled_module_count(),
            snap.modules.len()
        ))
        .line("Click for the full list")
}

fn system_info_tile(snap: &MetricSnapshot) -> Tile {
    Tile::new(TileKind::SystemInfo, "System")
        .line(format!("{} {}", snap.host.os_name, snap.host.os_version))
        .line(format!("Kernel: {}", snap.host.kernel))
        .line(format!("Arch: {}", snap.processor.arch))
        .line(format!("Host uptime: {}", format_uptime(snap.host.host_uptime_secs)))
}

fn module_entry_tile(module: &ModuleInfo) -> Tile {
    let mut tile = Tile::new(TileKind::ModuleEntry, module.name.clone()).line(if module.enabled {
        "Status: enabled"
    } else {
        "Status: disabled"
    });

    match &module.estimate {
        Some(e) => {
            tile = tile
                .line(format!("CPU: ~{}%", format_decimal(e.cpu_pct)))
                .line(format!("Memory: ~{}", format_bytes(e.memory_bytes)))
                .line(format!("Load time: {} ms", e.load_millis));
        }
        None => {
            tile = tile.line("CPU: N/A (disabled)").line("Memory: N/A (disabled)");
        }
    }

    tile = tile.line(format!("Version: {}", module.version));
    if !module.authors.is_empty() {
        tile = tile.line(format!("Authors: {}", module.authors.join(", ")));
    }
    if !module.description.is_empty() {
        tile = tile.line(truncated(&module.description));
    }
    tile
}

fn truncated(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_LIMIT {
        return text.to_string();
    }
    let head: String = text.chars().take(DESCRIPTION_LIMIT - 3).collect();
    format!("{head}...")
}

/// Fill unoccupied edge slots with filler tiles: the whole top and bottom
/// rows plus the first and last column of the rows between.
fn add_border(frame: &mut SurfaceFrame) -> Result<(), RenderError> {
    let rows = frame.capacity / 9;
    for slot in 0..frame.capacity {
        let row = slot / 9;
        let col = slot % 9;
        let edge = row == 0 || row == rows - 1 || col == 0 || col == 8;
        if edge && !frame.occupied(slot) {
            frame.place(slot, Tile::new(TileKind::Filler, ""))?;
        }
    }
    Ok(())
}
