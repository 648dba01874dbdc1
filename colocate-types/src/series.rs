use crate::point::GeoPoint;
use crate::window::TimeWindow;
use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Time-ordered observations from one instrument or dataset.
///
/// Construction sorts points by time (stable, so equal timestamps keep their
/// input order) and drops repeated `(time, latitude, longitude)` triples,
/// keeping the first occurrence. The set of variable names is the union over
/// all points and is fixed once the series is built.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<GeoPoint>", into = "Vec<GeoPoint>")]
pub struct PointSeries {
    points: Vec<GeoPoint>,
    variables: BTreeSet<String>,
    duplicates_removed: usize,
}

/// Hashable identity of an observation.
type PointKey = (i64, u32, u64, u64);

fn coordinate_bits(value: f64) -> u64 {
    // -0.0 and 0.0 denote the same location
    if value == 0.0 { 0 } else { value.to_bits() }
}

fn point_key(point: &GeoPoint) -> PointKey {
    (
        point.time.timestamp(),
        point.time.timestamp_subsec_nanos(),
        coordinate_bits(point.latitude()),
        coordinate_bits(point.longitude()),
    )
}

impl PointSeries {
    pub fn new(mut points: Vec<GeoPoint>) -> Self {
        points.sort_by_key(|p| p.time);

        let before = points.len();
        let mut seen: FxHashSet<PointKey> = FxHashSet::default();
        seen.reserve(before);
        points.retain(|p| seen.insert(point_key(p)));
        let duplicates_removed = before - points.len();

        let variables = points
            .iter()
            .flat_map(|p| p.values.keys().cloned())
            .collect();

        Self {
            points,
            variables,
            duplicates_removed,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GeoPoint> {
        self.points.get(index)
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeoPoint> {
        self.points.iter()
    }

    /// Names of every variable carried by at least one point.
    pub fn variables(&self) -> &BTreeSet<String> {
        &self.variables
    }

    /// Number of repeated observations dropped at construction.
    pub fn duplicates_removed(&self) -> usize {
        self.duplicates_removed
    }

    /// Earliest and latest timestamps, or `None` when empty.
    pub fn time_span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => Some((first.time, last.time)),
            _ => None,
        }
    }

    /// Points whose timestamps fall inside `window`, as a new series.
    ///
    /// Uses binary search over the sorted timestamps.
    pub fn slice_window(&self, window: &TimeWindow) -> PointSeries {
        let lo = self.points.partition_point(|p| p.time < window.start());
        let hi = if window.is_closed() {
            self.points.partition_point(|p| p.time <= window.end())
        } else {
            self.points.partition_point(|p| p.time < window.end())
        };

        if lo >= hi {
            return PointSeries::empty();
        }
        PointSeries::new(self.points[lo..hi].to_vec())
    }

    pub fn into_points(self) -> Vec<GeoPoint> {
        self.points
    }
}

impl From<Vec<GeoPoint>> for PointSeries {
    fn from(points: Vec<GeoPoint>) -> Self {
        PointSeries::new(points)
    }
}

impl From<PointSeries> for Vec<GeoPoint> {
    fn from(series: PointSeries) -> Self {
        series.points
    }
}

impl FromIterator<GeoPoint> for PointSeries {
    fn from_iter<I: IntoIterator<Item = GeoPoint>>(iter: I) -> Self {
        PointSeries::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PointSeries {
    type Item = &'a GeoPoint;
    type IntoIter = std::slice::Iter<'a, GeoPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn t(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap() + TimeDelta::hours(hours)
    }

    #[test]
    fn test_series_sorted_by_time() {
        let series = PointSeries::new(vec![
            GeoPoint::new(1.0, 1.0, t(5)),
            GeoPoint::new(2.0, 2.0, t(1)),
            GeoPoint::new(3.0, 3.0, t(3)),
        ]);

        let times: Vec<_> = series.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![t(1), t(3), t(5)]);
        assert_eq!(series.time_span(), Some((t(1), t(5))));
    }

    #[test]
    fn test_series_sort_is_stable_for_equal_times() {
        let series = PointSeries::new(vec![
            GeoPoint::new(10.0, 0.0, t(0)),
            GeoPoint::new(20.0, 0.0, t(0)),
            GeoPoint::new(30.0, 0.0, t(0)),
        ]);
        let lats: Vec<_> = series.iter().map(|p| p.latitude()).collect();
        assert_eq!(lats, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn test_series_removes_duplicates() {
        let series = PointSeries::new(vec![
            GeoPoint::new(1.0, 1.0, t(0)).with_value("aod", 0.1),
            GeoPoint::new(1.0, 1.0, t(0)).with_value("aod", 0.9),
            GeoPoint::new(1.0, 1.0, t(1)),
            GeoPoint::new(1.0, -0.0, t(2)),
            GeoPoint::new(1.0, 0.0, t(2)),
        ]);

        assert_eq!(series.len(), 3);
        assert_eq!(series.duplicates_removed(), 2);
        // first occurrence wins
        assert_eq!(
            series.get(0).and_then(|p| p.value("aod")).and_then(|v| v.as_scalar()),
            Some(0.1)
        );
    }

    #[test]
    fn test_series_variables_union() {
        let series = PointSeries::new(vec![
            GeoPoint::new(0.0, 0.0, t(0)).with_value("aod", 0.1),
            GeoPoint::new(0.0, 1.0, t(1)).with_value("ssa", 0.9),
        ]);
        let vars: Vec<_> = series.variables().iter().cloned().collect();
        assert_eq!(vars, vec!["aod".to_string(), "ssa".to_string()]);
    }

    #[test]
    fn test_empty_series() {
        let series = PointSeries::empty();
        assert!(series.is_empty());
        assert!(series.time_span().is_none());
        assert!(series.variables().is_empty());
    }

    #[test]
    fn test_slice_window_half_open() {
        let series: PointSeries = (0..6).map(|h| GeoPoint::new(0.0, h as f64, t(h))).collect();

        let w = TimeWindow::new(t(1), t(3)).unwrap();
        let slice = series.slice_window(&w);
        let times: Vec<_> = slice.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![t(1), t(2)]);

        let closed = TimeWindow::closed(t(4), t(5)).unwrap();
        assert_eq!(series.slice_window(&closed).len(), 2);

        let outside = TimeWindow::new(t(10), t(12)).unwrap();
        assert!(series.slice_window(&outside).is_empty());
    }

    #[test]
    fn test_series_serde_as_point_list() {
        let series = PointSeries::new(vec![
            GeoPoint::new(0.0, 0.0, t(1)),
            GeoPoint::new(0.0, 0.0, t(0)),
        ]);
        let json = serde_json::to_string(&series).unwrap();
        let back: PointSeries = serde_json::from_str(&json).unwrap();
        assert_eq!(back, series);
        assert_eq!(back.get(0).map(|p| p.time), Some(t(0)));
    }
}
