use chrono::{DateTime, Utc};
use geo::Point;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

/// A measured quantity attached to an observation.
///
/// Scalars cover column quantities such as optical depth. Profiles cover
/// per-altitude arrays (backscatter, extinction) and are shared through an
/// `Arc`, so cloning a point never copies the underlying samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(f64),
    Profile(Arc<[f64]>),
}

impl Value {
    /// Returns the scalar value, if this is a scalar.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::Profile(_) => None,
        }
    }

    /// Returns the profile samples, if this is a profile.
    pub fn as_profile(&self) -> Option<&[f64]> {
        match self {
            Value::Scalar(_) => None,
            Value::Profile(samples) => Some(samples),
        }
    }

    /// Number of samples carried (1 for scalars).
    pub fn len(&self) -> usize {
        match self {
            Value::Scalar(_) => 1,
            Value::Profile(samples) => samples.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(value)
    }
}

impl From<Vec<f64>> for Value {
    fn from(samples: Vec<f64>) -> Self {
        Value::Profile(samples.into())
    }
}

impl From<Arc<[f64]>> for Value {
    fn from(samples: Arc<[f64]>) -> Self {
        Value::Profile(samples)
    }
}

impl fmt::Display for Value {
    /// Scalars print as-is, profiles as `;`-separated samples.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(v) => write!(f, "{}", v),
            Value::Profile(samples) => {
                for (i, sample) in samples.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    write!(f, "{}", sample)?;
                }
                Ok(())
            }
        }
    }
}

/// One observation: a location, an acquisition time and its measured values.
///
/// The location is held as a `geo::Point` with x = longitude and
/// y = latitude, both in degrees.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use colocate_types::point::GeoPoint;
///
/// let t = Utc.with_ymd_and_hms(2021, 8, 3, 14, 30, 0).unwrap();
/// let profile = GeoPoint::new(16.73, -22.94, t)
///     .with_value("cloud_fraction", 0.2)
///     .with_value("backscatter_532", vec![0.0012, 0.0010, 0.0007]);
///
/// assert_eq!(profile.latitude(), 16.73);
/// assert_eq!(profile.longitude(), -22.94);
/// assert_eq!(profile.value("backscatter_532").map(|v| v.len()), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub point: Point<f64>,
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
}

impl GeoPoint {
    /// Create an observation without measured values.
    pub fn new(latitude: f64, longitude: f64, time: DateTime<Utc>) -> Self {
        Self {
            point: Point::new(longitude, latitude),
            time,
            values: BTreeMap::new(),
        }
    }

    /// Attach a measured quantity, replacing any previous value with the same name.
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    #[inline]
    pub fn latitude(&self) -> f64 {
        self.point.y()
    }

    #[inline]
    pub fn longitude(&self) -> f64 {
        self.point.x()
    }

    #[inline]
    pub fn point(&self) -> &Point<f64> {
        &self.point
    }

    #[inline]
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// True when both latitude and longitude are finite numbers.
    ///
    /// Fill values encoded as NaN or infinity fail this check.
    #[inline]
    pub fn has_finite_coordinates(&self) -> bool {
        self.latitude().is_finite() && self.longitude().is_finite()
    }

    /// Copy of this observation restricted to the given variables.
    ///
    /// Names absent from this point are ignored. Profiles stay shared with
    /// the original.
    pub fn select(&self, variables: &BTreeSet<String>) -> GeoPoint {
        let values = self
            .values
            .iter()
            .filter(|(name, _)| variables.contains(name.as_str()))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        GeoPoint {
            point: self.point,
            time: self.time,
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_geopoint_creation() {
        let p = GeoPoint::new(16.0, -23.0, t0());
        assert_eq!(p.latitude(), 16.0);
        assert_eq!(p.longitude(), -23.0);
        assert_eq!(p.point().x(), -23.0);
        assert_eq!(p.point().y(), 16.0);
        assert_eq!(p.time(), t0());
        assert!(p.values().is_empty());
    }

    #[test]
    fn test_finite_coordinates() {
        assert!(GeoPoint::new(16.0, -23.0, t0()).has_finite_coordinates());
        assert!(!GeoPoint::new(16.0, f64::NAN, t0()).has_finite_coordinates());
        assert!(!GeoPoint::new(f64::INFINITY, 0.0, t0()).has_finite_coordinates());
    }

    #[test]
    fn test_select_keeps_only_requested_variables() {
        let p = GeoPoint::new(0.0, 0.0, t0())
            .with_value("aod", 0.3)
            .with_value("ssa", 0.92)
            .with_value("profile", vec![1.0, 2.0]);

        let wanted: BTreeSet<String> = ["aod", "profile", "missing"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let selected = p.select(&wanted);

        assert_eq!(selected.values().len(), 2);
        assert_eq!(selected.value("aod"), Some(&Value::Scalar(0.3)));
        assert!(selected.value("ssa").is_none());
        assert_eq!(selected.point, p.point);
        assert_eq!(selected.time, p.time);
    }

    #[test]
    fn test_select_shares_profiles() {
        let p = GeoPoint::new(0.0, 0.0, t0()).with_value("beta", vec![0.1, 0.2, 0.3]);
        let wanted: BTreeSet<String> = std::iter::once("beta".to_string()).collect();
        let selected = p.select(&wanted);

        match (p.value("beta"), selected.value("beta")) {
            (Some(Value::Profile(a)), Some(Value::Profile(b))) => assert!(Arc::ptr_eq(a, b)),
            other => panic!("expected profiles, got {:?}", other),
        }
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Scalar(0.5).to_string(), "0.5");
        assert_eq!(Value::from(vec![1.0, 2.5, -3.0]).to_string(), "1;2.5;-3");
        assert_eq!(Value::from(Vec::new()).to_string(), "");
    }

    #[test]
    fn test_value_accessors() {
        let scalar = Value::from(1.5);
        assert_eq!(scalar.as_scalar(), Some(1.5));
        assert!(scalar.as_profile().is_none());
        assert_eq!(scalar.len(), 1);

        let profile = Value::from(vec![1.0, 2.0]);
        assert_eq!(profile.as_profile(), Some(&[1.0, 2.0][..]));
        assert!(profile.as_scalar().is_none());
        assert!(!profile.is_empty());
    }

    #[test]
    fn test_geopoint_serde() {
        let p = GeoPoint::new(45.5, 7.25, t0())
            .with_value("aod", 0.12)
            .with_value("beta", vec![0.5, 0.25]);

        let json = serde_json::to_string(&p).unwrap();
        let back: GeoPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
