// crates/core/src/error.rs
use thiserror::Error;

/// Errors that can occur while building a surface frame
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("Slot {slot} out of range for a {capacity}-slot surface")]
    SlotOutOfRange { slot: usize, capacity: usize },
}

impl RenderError {
    pub fn slot_out_of_range(slot: usize, capacity: usize) -> Self {
        Self::SlotOutOfRange { slot, capacity }
    }
}
