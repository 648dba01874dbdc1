use crate::point::GeoPoint;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

/// An accepted colocation between one observation of each series.
///
/// `time_delta` is signed: `point_b.time - point_a.time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPair {
    pub point_a: GeoPoint,
    pub point_b: GeoPoint,
    pub distance_km: f64,
    #[serde(with = "seconds")]
    pub time_delta: TimeDelta,
}

impl MatchPair {
    pub fn new(point_a: GeoPoint, point_b: GeoPoint, distance_km: f64, time_delta: TimeDelta) -> Self {
        Self {
            point_a,
            point_b,
            distance_km,
            time_delta,
        }
    }

    pub fn abs_time_delta(&self) -> TimeDelta {
        self.time_delta.abs()
    }

    /// Signed time offset in fractional seconds.
    pub fn time_delta_seconds(&self) -> f64 {
        seconds::to_f64(self.time_delta)
    }
}

/// Serializes a `TimeDelta` as fractional seconds (millisecond resolution).
mod seconds {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub(super) fn to_f64(delta: TimeDelta) -> f64 {
        delta.num_milliseconds() as f64 / 1000.0
    }

    pub fn serialize<S: Serializer>(delta: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(to_f64(*delta))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() {
            return Err(D::Error::custom(format!(
                "time delta must be finite, got: {}",
                secs
            )));
        }
        TimeDelta::try_milliseconds((secs * 1000.0).round() as i64)
            .ok_or_else(|| D::Error::custom(format!("time delta out of range: {}", secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn pair(delta: TimeDelta) -> MatchPair {
        let t = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        MatchPair::new(
            GeoPoint::new(16.0, -23.0, t),
            GeoPoint::new(16.01, -23.01, t + delta),
            1.54,
            delta,
        )
    }

    #[test]
    fn test_abs_time_delta() {
        let p = pair(TimeDelta::minutes(-90));
        assert_eq!(p.abs_time_delta(), TimeDelta::minutes(90));
        assert_eq!(p.time_delta_seconds(), -5400.0);
    }

    #[test]
    fn test_time_delta_serialized_as_seconds() {
        let p = pair(TimeDelta::milliseconds(2500));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["time_delta"], serde_json::json!(2.5));

        let back: MatchPair = serde_json::from_value(json).unwrap();
        assert_eq!(back.time_delta, TimeDelta::milliseconds(2500));
    }
}
