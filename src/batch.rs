//! Date-range driven colocation runs.
//!
//! A run tiles the configured range, asks both sources for the observations
//! of each window, matches them and records one outcome per window. A window
//! whose data is missing or unreadable is reported and skipped; it never
//! stops the other windows.
//!
//! Series A is fetched for the window itself and series B for the window
//! widened by the temporal tolerance, so points of A near a window edge still
//! see candidates recorded just across it. Every point of A belongs to
//! exactly one window, so no pair is produced twice.

use crate::compute::colocation::{ColocationStats, Colocator};
use crate::compute::temporal::Tiles;
use crate::config::Config;
use crate::error::{ColocateError, Result};
use crate::sink::MatchSink;
use crate::source::DataSource;
use colocate_types::pair::MatchPair;
use colocate_types::series::PointSeries;
use colocate_types::window::TimeWindow;

/// What happened to one window.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowOutcome {
    Matched {
        pairs: Vec<MatchPair>,
        stats: ColocationStats,
    },
    /// A source had nothing for this window.
    Unavailable { reason: String },
    /// Reading or writing the window failed.
    Failed { reason: String },
}

impl WindowOutcome {
    pub fn is_matched(&self) -> bool {
        matches!(self, WindowOutcome::Matched { .. })
    }

    pub fn pairs(&self) -> &[MatchPair] {
        match self {
            WindowOutcome::Matched { pairs, .. } => pairs,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WindowReport {
    /// Position of the window in the tiling
    pub index: usize,
    pub window: TimeWindow,
    pub outcome: WindowOutcome,
}

/// Per-window outcomes of a run, in window order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    windows: Vec<WindowReport>,
}

impl BatchReport {
    pub fn windows(&self) -> &[WindowReport] {
        &self.windows
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn matched(&self) -> usize {
        self.count(|o| matches!(o, WindowOutcome::Matched { .. }))
    }

    pub fn unavailable(&self) -> usize {
        self.count(|o| matches!(o, WindowOutcome::Unavailable { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, WindowOutcome::Failed { .. }))
    }

    pub fn total_pairs(&self) -> usize {
        self.pairs().count()
    }

    /// All pairs across windows, in window order.
    pub fn pairs(&self) -> impl Iterator<Item = &MatchPair> {
        self.windows.iter().flat_map(|w| w.outcome.pairs().iter())
    }

    /// Matching counters summed over matched windows.
    pub fn stats(&self) -> ColocationStats {
        let mut total = ColocationStats::default();
        for report in &self.windows {
            if let WindowOutcome::Matched { stats, .. } = &report.outcome {
                total.merge(stats);
            }
        }
        total
    }

    fn count(&self, predicate: impl Fn(&WindowOutcome) -> bool) -> usize {
        self.windows.iter().filter(|w| predicate(&w.outcome)).count()
    }
}

/// Drives a colocation job over two data sources.
///
/// ```
/// use chrono::{TimeDelta, TimeZone, Utc};
/// use colocate::{BatchRunner, Config, GeoPoint, MemorySource, PointSeries};
///
/// let start = Utc.with_ymd_and_hms(2020, 7, 1, 0, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2020, 7, 2, 0, 0, 0).unwrap();
/// let noon = start + TimeDelta::hours(12);
///
/// let lidar = MemorySource::new("caliop", PointSeries::new(vec![GeoPoint::new(16.0, -23.0, noon)]));
/// let sunphotometer = MemorySource::new("aeronet", PointSeries::new(vec![GeoPoint::new(16.1, -23.0, noon)]));
///
/// let runner = BatchRunner::new(Config::new(start, end), lidar, sunphotometer)?;
/// let report = runner.run()?;
///
/// assert_eq!(report.len(), 2);
/// assert_eq!(report.matched(), 1);
/// assert_eq!(report.unavailable(), 1);
/// assert_eq!(report.total_pairs(), 1);
/// # Ok::<(), colocate::ColocateError>(())
/// ```
#[derive(Debug)]
pub struct BatchRunner<A, B> {
    config: Config,
    colocator: Colocator,
    source_a: A,
    source_b: B,
}

impl<A: DataSource, B: DataSource> BatchRunner<A, B> {
    /// Validate `config` and prepare a run.
    ///
    /// When both sources declare their variables, every configured variable
    /// must appear in at least one of them. Otherwise names are only checked
    /// against the data, and a name no window carries yields pairs without it.
    pub fn new(config: Config, source_a: A, source_b: B) -> Result<Self> {
        config.validate()?;
        let colocator = Colocator::from_config(&config)?;

        match (source_a.variables(), source_b.variables()) {
            (Some(variables_a), Some(variables_b)) => {
                colocator.check_variables(variables_a, variables_b)?
            }
            _ => log::debug!(
                "'{}' or '{}' declares no variables; skipping the up-front variable check",
                source_a.name(),
                source_b.name()
            ),
        }

        Ok(Self {
            config,
            colocator,
            source_a,
            source_b,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn colocator(&self) -> &Colocator {
        &self.colocator
    }

    pub fn windows(&self) -> Result<Tiles> {
        self.config.windows()
    }

    /// Process a single window.
    ///
    /// Missing data yields `Unavailable`, other recoverable failures yield
    /// `Failed`. A configured variable absent from this window's data only
    /// leaves the matching cells empty. Non-recoverable errors raised by a
    /// source are returned as `Err`.
    pub fn run_window(&self, index: usize, window: TimeWindow) -> Result<WindowReport> {
        let outcome = match self.colocate_window(&window) {
            Ok((pairs, stats)) => {
                log::debug!(
                    "Window {} matched {} of {} points",
                    window,
                    stats.matched,
                    stats.matched + stats.unmatched + stats.skipped_a
                );
                WindowOutcome::Matched { pairs, stats }
            }
            Err(e @ ColocateError::DataUnavailable { .. }) => {
                log::warn!("Skipping window {}: {}", window, e);
                WindowOutcome::Unavailable {
                    reason: e.to_string(),
                }
            }
            Err(e) if e.is_recoverable() => {
                log::error!("Window {} failed: {}", window, e);
                WindowOutcome::Failed {
                    reason: e.to_string(),
                }
            }
            Err(e) => return Err(e),
        };

        Ok(WindowReport {
            index,
            window,
            outcome,
        })
    }

    fn colocate_window(&self, window: &TimeWindow) -> Result<(Vec<MatchPair>, ColocationStats)> {
        let series_a = fetch(&self.source_a, window)?;
        let candidates = window.padded(self.colocator.temporal_window());
        let series_b = fetch(&self.source_b, &candidates)?;

        for name in self.colocator.variables() {
            if !series_a.variables().contains(name) && !series_b.variables().contains(name) {
                log::debug!("Variable '{}' is absent from window {}", name, window);
            }
        }

        Ok(self
            .colocator
            .colocate_unchecked(&series_a, &series_b)
            .finish())
    }

    /// Process every window and collect the outcomes.
    pub fn run(&self) -> Result<BatchReport> {
        let windows: Vec<TimeWindow> = self.windows()?.collect();
        log::info!(
            "Colocating '{}' with '{}' over {} windows from {} to {}",
            self.source_a.name(),
            self.source_b.name(),
            windows.len(),
            self.config.start,
            self.config.end
        );

        let report = BatchReport {
            windows: self.process(windows)?,
        };

        log::info!(
            "Run finished: {} matched, {} unavailable, {} failed, {} pairs",
            report.matched(),
            report.unavailable(),
            report.failed(),
            report.total_pairs()
        );
        Ok(report)
    }

    /// Process every window and hand each matched window to `sink`, in
    /// window order.
    ///
    /// A window the sink fails to write is reported as `Failed`. Errors from
    /// [`MatchSink::finish`] are returned.
    pub fn run_with_sink<S: MatchSink>(&self, mut sink: S) -> Result<BatchReport> {
        let mut report = self.run()?;

        for entry in &mut report.windows {
            let WindowOutcome::Matched { pairs, .. } = &entry.outcome else {
                continue;
            };
            if let Err(e) = sink.write(&entry.window, pairs) {
                log::error!("Failed to write window {}: {}", entry.window, e);
                entry.outcome = WindowOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        }

        sink.finish()?;
        Ok(report)
    }

    #[cfg(not(feature = "parallel"))]
    fn process(&self, windows: Vec<TimeWindow>) -> Result<Vec<WindowReport>> {
        windows
            .into_iter()
            .enumerate()
            .map(|(index, window)| self.run_window(index, window))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn process(&self, windows: Vec<TimeWindow>) -> Result<Vec<WindowReport>> {
        use rayon::prelude::*;

        windows
            .into_par_iter()
            .enumerate()
            .map(|(index, window)| self.run_window(index, window))
            .collect()
    }
}

fn fetch<S: DataSource>(source: &S, window: &TimeWindow) -> Result<PointSeries> {
    let series = source.fetch(window)?;
    if series.is_empty() {
        return Err(ColocateError::DataUnavailable {
            source_id: source.name().to_string(),
            window: *window,
        });
    }
    if series.duplicates_removed() > 0 {
        log::debug!(
            "Dropped {} duplicate observations from '{}' for window {}",
            series.duplicates_removed(),
            source.name(),
            window
        );
    }
    Ok(series)
}
