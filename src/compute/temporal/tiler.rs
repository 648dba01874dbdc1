//! Partitioning of a date range into fixed-width time windows.

use crate::error::{ColocateError, Result};
use chrono::{DateTime, TimeDelta, Utc};
use colocate_types::window::TimeWindow;
use serde::{Deserialize, Serialize};
use std::iter::FusedIterator;

/// Step between consecutive windows of a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    /// One window per calendar day (24 h).
    #[default]
    Daily,
    /// One window per hour.
    Hourly,
    /// Windows of a fixed number of minutes.
    Minutes(u32),
}

impl Cadence {
    pub fn step(&self) -> TimeDelta {
        match self {
            Cadence::Daily => TimeDelta::days(1),
            Cadence::Hourly => TimeDelta::hours(1),
            Cadence::Minutes(m) => TimeDelta::minutes(i64::from(*m)),
        }
    }

    /// `chrono` format used to label windows of this cadence.
    pub fn label_format(&self) -> &'static str {
        match self {
            Cadence::Daily => "%Y%m%d",
            Cadence::Hourly => "%Y%m%d_%H",
            Cadence::Minutes(_) => "%Y%m%d_%H%M",
        }
    }
}

/// Splits `[start, end]` into consecutive windows of width `step`.
///
/// Windows are `[start, start+step), [start+step, start+2*step), …` and
/// generation stops once a window would start after `end`. The last window
/// is clipped to `end` and closed, so when `end - start` is a multiple of
/// `step` the sequence ends with the zero-width window `[end, end]`.
///
/// # Errors
///
/// `InvalidRange` when `start > end`, `InvalidStep` when `step <= 0`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use colocate::compute::temporal::tile;
///
/// let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2020, 1, 3, 0, 0, 0).unwrap();
///
/// let windows: Vec<_> = tile(start, end, TimeDelta::days(1))?.collect();
/// assert_eq!(windows.len(), 3);
/// assert!(windows[2].is_empty());
/// # Ok::<(), colocate::ColocateError>(())
/// ```
pub fn tile(start: DateTime<Utc>, end: DateTime<Utc>, step: TimeDelta) -> Result<Tiles> {
    if start > end {
        return Err(ColocateError::InvalidRange { start, end });
    }
    if step <= TimeDelta::zero() {
        return Err(ColocateError::InvalidStep(format!(
            "step must be positive, got {}",
            step
        )));
    }

    Ok(Tiles {
        cursor: Some(start),
        end,
        step,
    })
}

/// Daily tiling of `[start, end]`.
pub fn tile_daily(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Tiles> {
    tile(start, end, Cadence::Daily.step())
}

/// Hourly tiling of `[start, end]`.
pub fn tile_hourly(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Tiles> {
    tile(start, end, Cadence::Hourly.step())
}

/// Lazy sequence of windows returned by [`tile`].
///
/// Cloning restarts nothing: a clone continues from the same position. Call
/// [`tile`] again with the same arguments to regenerate the full sequence.
#[derive(Debug, Clone)]
pub struct Tiles {
    cursor: Option<DateTime<Utc>>,
    end: DateTime<Utc>,
    step: TimeDelta,
}

impl Tiles {
    pub fn step(&self) -> TimeDelta {
        self.step
    }

    fn remaining(&self) -> usize {
        let Some(cursor) = self.cursor else {
            return 0;
        };
        let span = self.end - cursor;
        let full_steps = match (span.num_nanoseconds(), self.step.num_nanoseconds()) {
            (Some(span), Some(step)) => span / step,
            _ => span.num_seconds() / self.step.num_seconds().max(1),
        };
        usize::try_from(full_steps).unwrap_or(usize::MAX - 1) + 1
    }
}

impl Iterator for Tiles {
    type Item = TimeWindow;

    fn next(&mut self) -> Option<TimeWindow> {
        let start = self.cursor?;

        match start.checked_add_signed(self.step) {
            Some(next) if next <= self.end => {
                self.cursor = Some(next);
                TimeWindow::new(start, next)
            }
            _ => {
                self.cursor = None;
                TimeWindow::closed(start, self.end)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for Tiles {}

impl FusedIterator for Tiles {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ymd(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn assert_contiguous_cover(windows: &[TimeWindow], start: DateTime<Utc>, end: DateTime<Utc>) {
        assert!(!windows.is_empty());
        assert_eq!(windows[0].start(), start);
        assert_eq!(windows[windows.len() - 1].end(), end);
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start());
            assert!(!pair[0].is_closed());
        }
        assert!(windows[windows.len() - 1].is_closed());
        for w in windows {
            assert!(w.start() <= w.end());
        }
    }

    #[test]
    fn test_three_day_scenario() {
        let windows: Vec<_> = tile(ymd(2020, 1, 1), ymd(2020, 1, 3), TimeDelta::days(1))
            .unwrap()
            .collect();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0], TimeWindow::new(ymd(2020, 1, 1), ymd(2020, 1, 2)).unwrap());
        assert_eq!(windows[1], TimeWindow::new(ymd(2020, 1, 2), ymd(2020, 1, 3)).unwrap());
        assert_eq!(windows[2], TimeWindow::closed(ymd(2020, 1, 3), ymd(2020, 1, 3)).unwrap());
        assert!(windows[2].is_empty());
    }

    #[test]
    fn test_final_window_clipped_not_extended() {
        let start = ymd(2020, 1, 1);
        let end = start + TimeDelta::hours(60);
        let windows: Vec<_> = tile_daily(start, end).unwrap().collect();

        assert_eq!(windows.len(), 3);
        assert_eq!(windows[2].start(), ymd(2020, 1, 3));
        assert_eq!(windows[2].end(), end);
        assert_eq!(windows[2].duration(), TimeDelta::hours(12));
        assert_contiguous_cover(&windows, start, end);
    }

    #[test]
    fn test_start_equals_end() {
        let t = ymd(2021, 6, 1);
        let windows: Vec<_> = tile_hourly(t, t).unwrap().collect();
        assert_eq!(windows.len(), 1);
        assert!(windows[0].is_empty());
        assert!(windows[0].contains(t));
    }

    #[test]
    fn test_hourly_over_a_day() {
        let start = ymd(2020, 2, 28);
        let end = ymd(2020, 2, 29);
        let windows: Vec<_> = tile_hourly(start, end).unwrap().collect();
        assert_eq!(windows.len(), 25);
        assert_contiguous_cover(&windows, start, end);
        assert!(windows[..24].iter().all(|w| w.duration() == TimeDelta::hours(1)));
    }

    #[test]
    fn test_contiguous_cover_for_many_steps() {
        let start = ymd(2019, 12, 30) + TimeDelta::minutes(17);
        let end = ymd(2020, 1, 4) + TimeDelta::minutes(3);
        for step in [
            TimeDelta::minutes(7),
            TimeDelta::hours(1),
            TimeDelta::hours(5),
            TimeDelta::days(1),
            TimeDelta::days(30),
        ] {
            let windows: Vec<_> = tile(start, end, step).unwrap().collect();
            assert_contiguous_cover(&windows, start, end);
            assert!(windows.iter().all(|w| w.duration() <= step));
        }
    }

    #[test]
    fn test_tiling_is_deterministic() {
        let start = ymd(2020, 1, 1);
        let end = ymd(2020, 3, 1);
        let first: Vec<_> = tile_daily(start, end).unwrap().collect();
        let second: Vec<_> = tile_daily(start, end).unwrap().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_exact_size() {
        let start = ymd(2020, 1, 1);
        let end = start + TimeDelta::hours(60);
        let mut tiles = tile_daily(start, end).unwrap();
        assert_eq!(tiles.len(), 3);
        tiles.next();
        assert_eq!(tiles.len(), 2);
        tiles.next();
        tiles.next();
        assert_eq!(tiles.len(), 0);
        assert!(tiles.next().is_none());

        assert_eq!(tile_daily(ymd(2020, 1, 1), ymd(2020, 1, 3)).unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_range() {
        let err = tile(ymd(2020, 1, 3), ymd(2020, 1, 1), TimeDelta::days(1)).unwrap_err();
        assert!(matches!(err, ColocateError::InvalidRange { .. }));
    }

    #[test]
    fn test_invalid_step() {
        let start = ymd(2020, 1, 1);
        let end = ymd(2020, 1, 2);
        assert!(matches!(
            tile(start, end, TimeDelta::zero()),
            Err(ColocateError::InvalidStep(_))
        ));
        assert!(matches!(
            tile(start, end, TimeDelta::hours(-1)),
            Err(ColocateError::InvalidStep(_))
        ));
    }

    #[test]
    fn test_cadence_steps_and_labels() {
        assert_eq!(Cadence::Daily.step(), TimeDelta::days(1));
        assert_eq!(Cadence::Hourly.step(), TimeDelta::hours(1));
        assert_eq!(Cadence::Minutes(15).step(), TimeDelta::minutes(15));
        assert_eq!(Cadence::Hourly.label_format(), "%Y%m%d_%H");
        assert_eq!(Cadence::default(), Cadence::Daily);
    }
}
