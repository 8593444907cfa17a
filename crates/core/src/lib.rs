// crates/core/src/lib.rs
pub mod error;
pub mod estimate;
pub mod format;
pub mod layout;
pub mod mode;
pub mod render;
pub mod snapshot;
pub mod tile;

pub use error::*;
pub use estimate::*;
pub use format::*;
pub use layout::*;
pub use mode::*;
pub use render::{SurfaceFrame, DATA_UPDATED_NOTICE};
pub use snapshot::*;
pub use tile::*;
