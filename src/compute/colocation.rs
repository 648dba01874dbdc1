//! Nearest-in-space-and-time matching of two observation series.
//!
//! For every point of series A the matcher keeps a sliding range over
//! series B holding exactly the points with `|b.time - a.time| <= window`.
//! Both series are time-ordered, so the range bounds only move forward and
//! the temporal filtering costs O(|A| + |B|) overall. Distances are only
//! evaluated for points inside the range.

use crate::compute::spatial::{DistanceMetric, distance_km};
use crate::compute::validation::{is_matchable, validate_spatial_window, validate_temporal_window};
use crate::config::Config;
use crate::error::{ColocateError, Result};
use chrono::{DateTime, TimeDelta, Utc};
use colocate_types::pair::MatchPair;
use colocate_types::series::PointSeries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::iter::FusedIterator;

/// Counters collected while matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColocationStats {
    /// Points of A excluded for unusable coordinates.
    pub skipped_a: usize,
    /// Points of B excluded for unusable coordinates.
    pub skipped_b: usize,
    /// Points of A that produced a pair.
    pub matched: usize,
    /// Points of A with no candidate inside both windows.
    pub unmatched: usize,
    /// Distance evaluations performed.
    pub candidates_evaluated: usize,
}

impl ColocationStats {
    /// Total points excluded from matching across both series.
    pub fn skipped(&self) -> usize {
        self.skipped_a + self.skipped_b
    }

    /// Accumulate counters from another run.
    pub fn merge(&mut self, other: &ColocationStats) {
        self.skipped_a += other.skipped_a;
        self.skipped_b += other.skipped_b;
        self.matched += other.matched;
        self.unmatched += other.unmatched;
        self.candidates_evaluated += other.candidates_evaluated;
    }
}

/// Matching parameters.
///
/// # Examples
///
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use colocate::{Colocator, GeoPoint, PointSeries};
///
/// let t0 = Utc.with_ymd_and_hms(2020, 8, 1, 13, 0, 0).unwrap();
/// let lidar = PointSeries::new(vec![GeoPoint::new(16.0, -23.0, t0).with_value("aod", 0.4)]);
/// let photometer = PointSeries::new(vec![
///     GeoPoint::new(16.01, -23.01, t0).with_value("aod_500", 0.38),
///     GeoPoint::new(20.0, -23.0, t0).with_value("aod_500", 0.10),
/// ]);
///
/// let colocator = Colocator::new(50.0, TimeDelta::hours(1))?
///     .with_variables(["aod", "aod_500"]);
/// let pairs: Vec<_> = colocator.colocate(&lidar, &photometer)?.collect();
///
/// assert_eq!(pairs.len(), 1);
/// assert!(pairs[0].distance_km < 2.0);
/// # Ok::<(), colocate::ColocateError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Colocator {
    spatial_window_km: f64,
    temporal_window: TimeDelta,
    variables: BTreeSet<String>,
    metric: DistanceMetric,
}

impl Colocator {
    /// Create a matcher copying no variables into the pairs.
    pub fn new(spatial_window_km: f64, temporal_window: TimeDelta) -> Result<Self> {
        validate_spatial_window(spatial_window_km)?;
        validate_temporal_window(temporal_window)?;

        Ok(Self {
            spatial_window_km,
            temporal_window,
            variables: BTreeSet::new(),
            metric: DistanceMetric::default(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.spatial_window_km, config.temporal_window())?
            .with_variables(config.variables.iter().cloned())
            .with_metric(config.metric))
    }

    /// Variables to copy into each pair's points.
    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables = variables.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn spatial_window_km(&self) -> f64 {
        self.spatial_window_km
    }

    pub fn temporal_window(&self) -> TimeDelta {
        self.temporal_window
    }

    pub fn variables(&self) -> &BTreeSet<String> {
        &self.variables
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Match every point of `series_a` against `series_b`.
    ///
    /// Returns a lazy iterator yielding at most one pair per point of A, in
    /// the time order of A. Among candidates inside both windows the closest
    /// wins; ties go to the smallest absolute time offset, then to the
    /// earliest position in B.
    ///
    /// Points with non-finite or out-of-range coordinates are excluded and
    /// counted in [`Colocation::stats`].
    ///
    /// # Errors
    ///
    /// `UnknownVariable` when a requested variable is carried by neither
    /// series. The check is skipped when either series is empty, since the
    /// result is then empty anyway.
    pub fn colocate<'a>(
        &self,
        series_a: &'a PointSeries,
        series_b: &'a PointSeries,
    ) -> Result<Colocation<'a>> {
        if !series_a.is_empty() && !series_b.is_empty() {
            self.check_variables(series_a.variables(), series_b.variables())?;
        }
        Ok(self.colocate_unchecked(series_a, series_b))
    }

    /// Fails with `UnknownVariable` for the first requested variable found
    /// in neither schema.
    pub fn check_variables(
        &self,
        variables_a: &BTreeSet<String>,
        variables_b: &BTreeSet<String>,
    ) -> Result<()> {
        match self
            .variables
            .iter()
            .find(|name| !variables_a.contains(*name) && !variables_b.contains(*name))
        {
            Some(name) => Err(ColocateError::UnknownVariable(name.clone())),
            None => Ok(()),
        }
    }

    /// Like [`Colocator::colocate`] without the variable check.
    ///
    /// For callers that validated the variables against a wider schema than
    /// the two series at hand: requested variables missing from a point are
    /// simply absent from its copy in the pair.
    pub fn colocate_unchecked<'a>(
        &self,
        series_a: &'a PointSeries,
        series_b: &'a PointSeries,
    ) -> Colocation<'a> {
        let valid_a = matchable_indices(series_a);
        let valid_b = matchable_indices(series_b);

        let stats = ColocationStats {
            skipped_a: series_a.len() - valid_a.len(),
            skipped_b: series_b.len() - valid_b.len(),
            ..ColocationStats::default()
        };
        if stats.skipped() > 0 {
            log::debug!(
                "Excluding {} points of A and {} points of B with unusable coordinates",
                stats.skipped_a,
                stats.skipped_b
            );
        }

        Colocation {
            series_a,
            series_b,
            valid_a,
            valid_b,
            next_a: 0,
            lo: 0,
            hi: 0,
            spatial_window_km: self.spatial_window_km,
            temporal_window: self.temporal_window,
            variables: self.variables.clone(),
            metric: self.metric,
            stats,
        }
    }
}

fn matchable_indices(series: &PointSeries) -> Vec<usize> {
    series
        .iter()
        .enumerate()
        .filter(|(_, p)| is_matchable(p))
        .map(|(i, _)| i)
        .collect()
}

/// Match `series_a` against `series_b` with the given windows.
///
/// Shorthand for building a [`Colocator`] and calling
/// [`Colocator::colocate`].
pub fn colocate<'a>(
    series_a: &'a PointSeries,
    series_b: &'a PointSeries,
    spatial_window_km: f64,
    temporal_window: TimeDelta,
    variables: &BTreeSet<String>,
) -> Result<Colocation<'a>> {
    Colocator::new(spatial_window_km, temporal_window)?
        .with_variables(variables.iter().cloned())
        .colocate(series_a, series_b)
}

/// Lazy sequence of pairs returned by [`Colocator::colocate`].
#[derive(Debug, Clone)]
pub struct Colocation<'a> {
    series_a: &'a PointSeries,
    series_b: &'a PointSeries,
    valid_a: Vec<usize>,
    valid_b: Vec<usize>,
    next_a: usize,
    // [lo, hi) indexes into valid_b: the candidates inside the temporal window
    lo: usize,
    hi: usize,
    spatial_window_km: f64,
    temporal_window: TimeDelta,
    variables: BTreeSet<String>,
    metric: DistanceMetric,
    stats: ColocationStats,
}

impl<'a> Colocation<'a> {
    /// Counters so far. `skipped_a`/`skipped_b` are final from the start;
    /// the other counters grow as the iterator is advanced.
    pub fn stats(&self) -> &ColocationStats {
        &self.stats
    }

    /// Drain the remaining pairs and return them with the final counters.
    pub fn finish(mut self) -> (Vec<MatchPair>, ColocationStats) {
        let pairs: Vec<MatchPair> = self.by_ref().collect();
        (pairs, self.stats)
    }

    fn advance_window(&mut self, earliest: DateTime<Utc>, latest: DateTime<Utc>) {
        let series_b = self.series_b;
        let time_at = |i: usize| series_b.points()[i].time;

        while self.lo < self.valid_b.len() && time_at(self.valid_b[self.lo]) < earliest {
            self.lo += 1;
        }
        if self.hi < self.lo {
            self.hi = self.lo;
        }
        while self.hi < self.valid_b.len() && time_at(self.valid_b[self.hi]) <= latest {
            self.hi += 1;
        }
    }
}

impl<'a> Iterator for Colocation<'a> {
    type Item = MatchPair;

    fn next(&mut self) -> Option<MatchPair> {
        let series_a = self.series_a;
        let series_b = self.series_b;

        while let Some(&ia) = self.valid_a.get(self.next_a) {
            self.next_a += 1;
            let p = &series_a.points()[ia];

            let earliest = p
                .time
                .checked_sub_signed(self.temporal_window)
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            let latest = p
                .time
                .checked_add_signed(self.temporal_window)
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            self.advance_window(earliest, latest);

            let mut best: Option<(usize, f64, TimeDelta)> = None;
            for &ib in &self.valid_b[self.lo..self.hi] {
                let q = &series_b.points()[ib];
                let distance = distance_km(&p.point, &q.point, self.metric);
                self.stats.candidates_evaluated += 1;

                if !(distance <= self.spatial_window_km) {
                    continue;
                }

                let delta = q.time - p.time;
                let better = match best {
                    None => true,
                    Some((_, best_distance, best_delta)) => {
                        distance < best_distance
                            || (distance == best_distance && delta.abs() < best_delta.abs())
                    }
                };
                if better {
                    best = Some((ib, distance, delta));
                }
            }

            match best {
                Some((ib, distance, delta)) => {
                    self.stats.matched += 1;
                    let q = &series_b.points()[ib];
                    return Some(MatchPair::new(
                        p.select(&self.variables),
                        q.select(&self.variables),
                        distance,
                        delta,
                    ));
                }
                None => self.stats.unmatched += 1,
            }
        }

        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.valid_a.len() - self.next_a))
    }
}

impl<'a> FusedIterator for Colocation<'a> {}
