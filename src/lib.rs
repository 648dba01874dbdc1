//! Date-range tiling and nearest-in-space-and-time colocation of
//! irregularly sampled geospatial observations.
//!
//! ```rust
//! use chrono::{TimeDelta, TimeZone, Utc};
//! use colocate::{Colocator, GeoPoint, PointSeries, tile_daily};
//!
//! let start = Utc.with_ymd_and_hms(2020, 7, 14, 0, 0, 0).unwrap();
//! let end = Utc.with_ymd_and_hms(2020, 7, 15, 0, 0, 0).unwrap();
//! let windows: Vec<_> = tile_daily(start, end)?.collect();
//! assert_eq!(windows.len(), 2);
//!
//! let t = start + TimeDelta::hours(13);
//! let caliop = PointSeries::new(vec![GeoPoint::new(16.0, -23.0, t).with_value("aod_532", 0.41)]);
//! let aeronet = PointSeries::new(vec![GeoPoint::new(16.01, -23.01, t).with_value("aod_500", 0.38)]);
//!
//! let colocator = Colocator::new(50.0, TimeDelta::hours(1))?.with_variables(["aod_532", "aod_500"]);
//! let pairs: Vec<_> = colocator.colocate(&caliop, &aeronet)?.collect();
//! assert_eq!(pairs.len(), 1);
//! # Ok::<(), colocate::ColocateError>(())
//! ```

pub mod batch;
pub mod compute;
pub mod config;
pub mod error;
pub mod sink;
pub mod source;

pub use batch::{BatchReport, BatchRunner, WindowOutcome, WindowReport};
pub use config::Config;
pub use error::{ColocateError, Result};

pub use compute::colocation::{Colocation, ColocationStats, Colocator, colocate};
pub use compute::spatial::{DistanceMetric, EARTH_RADIUS_KM, distance_km, haversine_km};
pub use compute::temporal::{Cadence, Tiles, tile, tile_daily, tile_hourly};

pub use source::{DataSource, FnSource, MemorySource};

pub use sink::{CsvSink, MatchSink, MemorySink};
#[cfg(feature = "geojson")]
pub use sink::GeoJsonSink;

pub use colocate_types::pair::MatchPair;
pub use colocate_types::point::{GeoPoint, Value};
pub use colocate_types::series::PointSeries;
pub use colocate_types::window::TimeWindow;

pub use geo::Point;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{ColocateError, Config, Result};

    pub use crate::{GeoPoint, MatchPair, PointSeries, TimeWindow, Value};

    pub use crate::{Cadence, tile, tile_daily, tile_hourly};

    pub use crate::{Colocator, DistanceMetric, colocate, distance_km};

    pub use crate::{BatchRunner, WindowOutcome};

    pub use crate::{DataSource, MemorySource};

    pub use crate::{CsvSink, MatchSink, MemorySink};

    pub use chrono::{DateTime, TimeDelta, Utc};
}
