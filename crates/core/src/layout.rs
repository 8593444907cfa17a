// crates/core/src/layout.rs
//! Surface layout sizes.

use serde::{Deserialize, Serialize};

/// The fixed set of surface sizes, ordered smallest to largest. Each maps
/// to a slot capacity laid out in 9-slot rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutSize {
    Compact,
    Medium,
    Large,
    Full,
}

impl LayoutSize {
    /// Total slots in this layout.
    pub fn slot_count(self) -> usize {
        match self {
            LayoutSize::Compact => 27,
            LayoutSize::Medium => 36,
            LayoutSize::Large => 45,
            LayoutSize::Full => 54,
        }
    }

    /// Rows of nine slots.
    pub fn rows(self) -> usize {
        self.slot_count() / 9
    }

    /// The next size in the resize cycle. Wraps from the largest back to
    /// the smallest.
    pub fn next(self) -> Self {
        match self {
            LayoutSize::Compact => LayoutSize::Medium,
            LayoutSize::Medium => LayoutSize::Large,
            LayoutSize::Large => LayoutSize::Full,
            LayoutSize::Full => LayoutSize::Compact,
        }
    }
}

impl Default for LayoutSize {
    /// New sessions open at the largest layout.
    fn default() -> Self {
        LayoutSize::Full
    }
}
