//! Validation for geographic coordinates and matching windows.

use crate::error::{ColocateError, Result};
use chrono::TimeDelta;
use colocate_types::point::GeoPoint;
use colocate_types::series::PointSeries;

/// Coordinates at or beyond this magnitude are treated as missing-data
/// markers (-999, -9999, 1e36, ...) rather than bad positions.
pub const FILL_VALUE_MAGNITUDE: f64 = 999.0;

fn check_axis(name: &str, value: f64, limit: f64) -> Result<()> {
    if value.abs() >= FILL_VALUE_MAGNITUDE {
        return Err(ColocateError::InvalidInput(format!(
            "{} is a fill value: {}",
            name, value
        )));
    }

    if !(-limit..=limit).contains(&value) {
        return Err(ColocateError::InvalidInput(format!(
            "{} out of range [-{:.1}, {:.1}]: {}",
            name, limit, limit, value
        )));
    }

    Ok(())
}

/// Validates an observation has usable latitude and longitude.
///
/// Missing coordinates, whether non-finite or encoded as a fill value, are
/// reported separately from positions that are merely out of range.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use colocate::GeoPoint;
/// use colocate::compute::validation::validate_geographic_point;
///
/// let now = Utc::now();
/// assert!(validate_geographic_point(&GeoPoint::new(16.0, -23.0, now)).is_ok());
///
/// let err = validate_geographic_point(&GeoPoint::new(16.0, 200.0, now)).unwrap_err();
/// assert!(err.to_string().contains("out of range"));
///
/// let err = validate_geographic_point(&GeoPoint::new(-9999.0, 0.0, now)).unwrap_err();
/// assert!(err.to_string().contains("fill value"));
/// ```
pub fn validate_geographic_point(point: &GeoPoint) -> Result<()> {
    if !point.has_finite_coordinates() {
        return Err(ColocateError::InvalidInput(format!(
            "Coordinates must be finite, got: ({}, {})",
            point.latitude(),
            point.longitude()
        )));
    }

    check_axis("Latitude", point.latitude(), 90.0)?;
    check_axis("Longitude", point.longitude(), 180.0)
}

/// True when the point can take part in matching.
#[inline]
pub fn is_matchable(point: &GeoPoint) -> bool {
    validate_geographic_point(point).is_ok()
}

/// Validates every point of a series, reporting the first offending index.
pub fn validate_series(series: &PointSeries) -> Result<()> {
    for (idx, point) in series.iter().enumerate() {
        validate_geographic_point(point)
            .map_err(|e| ColocateError::InvalidInput(format!("Point at index {}: {}", idx, e)))?;
    }
    Ok(())
}

/// Validates a spatial matching radius.
///
/// Zero is allowed and only matches coincident locations.
///
/// ```
/// use colocate::compute::validation::validate_spatial_window;
///
/// assert!(validate_spatial_window(50.0).is_ok());
/// assert!(validate_spatial_window(0.0).is_ok());
/// assert!(validate_spatial_window(-1.0).is_err());
/// assert!(validate_spatial_window(f64::NAN).is_err());
/// ```
pub fn validate_spatial_window(km: f64) -> Result<()> {
    if !km.is_finite() {
        return Err(ColocateError::InvalidInput(format!(
            "Spatial window must be finite, got: {}",
            km
        )));
    }

    if km < 0.0 {
        return Err(ColocateError::InvalidInput(format!(
            "Spatial window must be non-negative, got: {} km",
            km
        )));
    }

    Ok(())
}

/// Validates a temporal matching tolerance. Zero means exact-time matches only.
pub fn validate_temporal_window(window: TimeDelta) -> Result<()> {
    if window < TimeDelta::zero() {
        return Err(ColocateError::InvalidInput(format!(
            "Temporal window must be non-negative, got: {}",
            window
        )));
    }
    Ok(())
}
