use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A time interval produced by tiling a date range.
///
/// Windows are half-open (`[start, end)`) except the last window of a
/// tiling, which is closed (`[start, end]`) so that the tiling covers the
/// requested range including its end instant. A zero-width window is
/// always closed.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use colocate_types::window::TimeWindow;
///
/// let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap();
///
/// let window = TimeWindow::new(start, end).unwrap();
/// assert!(window.contains(start));
/// assert!(!window.contains(end));
/// assert_eq!(window.label("%Y%m%d"), "20200101");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    #[serde(default)]
    closed: bool,
}

impl TimeWindow {
    /// Half-open window `[start, end)`. Returns `None` if `start > end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if start > end {
            return None;
        }
        Some(Self {
            start,
            end,
            closed: start == end,
        })
    }

    /// Closed window `[start, end]`. Returns `None` if `start > end`.
    pub fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        if start > end {
            return None;
        }
        Some(Self {
            start,
            end,
            closed: true,
        })
    }

    #[inline]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[inline]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether the end instant belongs to the window.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// True for a zero-width window.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        if self.closed {
            time >= self.start && time <= self.end
        } else {
            time >= self.start && time < self.end
        }
    }

    /// Window widened by `margin` on both sides, keeping this window's
    /// closedness.
    ///
    /// Used to fetch every observation that can pair with a point inside
    /// this window when matching tolerates offsets up to `margin`. Negative
    /// margins are treated as zero and bounds saturate at the representable
    /// range.
    ///
    /// ```
    /// use chrono::{TimeDelta, TimeZone, Utc};
    /// use colocate_types::window::TimeWindow;
    ///
    /// let start = Utc.with_ymd_and_hms(2020, 7, 1, 0, 0, 0).unwrap();
    /// let day = TimeWindow::new(start, start + TimeDelta::days(1)).unwrap();
    /// let padded = day.padded(TimeDelta::minutes(30));
    ///
    /// assert_eq!(padded.start(), start - TimeDelta::minutes(30));
    /// assert!(padded.contains(start + TimeDelta::days(1) + TimeDelta::minutes(5)));
    /// ```
    pub fn padded(&self, margin: TimeDelta) -> TimeWindow {
        let margin = margin.max(TimeDelta::zero());
        TimeWindow {
            start: self
                .start
                .checked_sub_signed(margin)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: self
                .end
                .checked_add_signed(margin)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            closed: self.closed,
        }
    }

    /// Formats the window start with a `chrono` format string.
    ///
    /// Callers use this to name one output file or directory per window.
    pub fn label(&self, format: &str) -> String {
        self.start.format(format).to_string()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let close = if self.closed { ']' } else { ')' };
        write!(
            f,
            "[{}, {}{}",
            self.start.to_rfc3339(),
            self.end.to_rfc3339(),
            close
        )
    }
}
