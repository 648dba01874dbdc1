//! # colocate-types
//!
//! Core observation types shared by the colocate tiler and matcher.
//!
//! - **Point types**: `GeoPoint`, `Value`
//! - **Series types**: `PointSeries`
//! - **Window types**: `TimeWindow`
//! - **Match types**: `MatchPair`
//!
//! All types are serializable with Serde and built on top of the `geo` crate's
//! `Point` and `chrono`'s UTC timestamps.
//!
//! ## Examples
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use colocate_types::point::GeoPoint;
//! use colocate_types::series::PointSeries;
//!
//! let t0 = Utc.with_ymd_and_hms(2020, 6, 15, 12, 0, 0).unwrap();
//! let point = GeoPoint::new(16.0, -23.0, t0).with_value("aod_532", 0.41);
//!
//! let series = PointSeries::new(vec![point]);
//! assert_eq!(series.len(), 1);
//! assert!(series.variables().contains("aod_532"));
//! ```

pub mod pair;
pub mod point;
pub mod series;
pub mod window;
