//! Temporal computation.
//!
//! - `tiler`: partitioning of date ranges into batch windows

pub mod tiler;
pub use tiler::{Cadence, Tiles, tile, tile_daily, tile_hourly};
