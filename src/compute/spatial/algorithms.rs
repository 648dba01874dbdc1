//! Great-circle distances between observations.

use geo::{Distance, Geodesic, Point};
use serde::{Deserialize, Serialize};

/// Sphere radius used by the haversine metric, in kilometres.
///
/// Historical matchup outputs were produced with this value rather than the
/// IUGG mean radius; keep it for numeric consistency.
pub const EARTH_RADIUS_KM: f64 = 6373.0;

/// Distance metric for spatial matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Haversine formula on a sphere of radius [`EARTH_RADIUS_KM`].
    #[default]
    Haversine,
    /// Geodesic distance on the WGS84 ellipsoid (Karney).
    Geodesic,
}

/// Haversine distance between two points in kilometres.
///
/// Points are `geo::Point`s with x = longitude and y = latitude in degrees.
///
/// # Examples
///
/// ```
/// use colocate::compute::spatial::haversine_km;
/// use geo::Point;
///
/// let cape_verde = Point::new(-23.0, 16.0);
/// let nearby = Point::new(-23.01, 16.01);
///
/// let d = haversine_km(&cape_verde, &nearby);
/// assert!(d > 1.5 && d < 1.6);
/// assert_eq!(haversine_km(&cape_verde, &cape_verde), 0.0);
/// ```
pub fn haversine_km(a: &Point<f64>, b: &Point<f64>) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let delta_lat = (b.y() - a.y()).to_radians();
    let delta_lon = (b.x() - a.x()).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance in kilometres using the requested metric.
pub fn distance_km(a: &Point<f64>, b: &Point<f64>, metric: DistanceMetric) -> f64 {
    match metric {
        DistanceMetric::Haversine => haversine_km(a, b),
        DistanceMetric::Geodesic => Geodesic.distance(*a, *b) / 1000.0,
    }
}
