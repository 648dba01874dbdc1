//! Compute layer: distance functions, window tiling, validation and the
//! colocation matcher.
//!
//! Nothing in here performs I/O. Data access lives in [`crate::source`] and
//! output in [`crate::sink`].

pub mod colocation;
pub mod spatial;
pub mod temporal;
pub mod validation;
