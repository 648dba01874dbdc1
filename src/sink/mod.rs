//! Output abstraction for matched pairs.
//!
//! A sink receives the pairs of each window once that window has been
//! processed. Sinks run on the caller's thread, in window order.

use crate::error::Result;
use colocate_types::pair::MatchPair;
use colocate_types::window::TimeWindow;

mod csv_sink;
#[cfg(feature = "geojson")]
mod geojson_sink;

pub use csv_sink::CsvSink;
#[cfg(feature = "geojson")]
pub use geojson_sink::{GeoJsonSink, pair_to_feature, pairs_to_feature_collection};

/// Trait for match output implementations
pub trait MatchSink {
    /// Persist the pairs of one window
    fn write(&mut self, window: &TimeWindow, pairs: &[MatchPair]) -> Result<()>;

    /// Flush anything buffered once all windows are written
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: MatchSink + ?Sized> MatchSink for &mut S {
    fn write(&mut self, window: &TimeWindow, pairs: &[MatchPair]) -> Result<()> {
        (**self).write(window, pairs)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Sink keeping every window's pairs in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    windows: Vec<(TimeWindow, Vec<MatchPair>)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn windows(&self) -> &[(TimeWindow, Vec<MatchPair>)] {
        &self.windows
    }

    pub fn pairs(&self) -> impl Iterator<Item = &MatchPair> {
        self.windows.iter().flat_map(|(_, pairs)| pairs.iter())
    }

    pub fn into_windows(self) -> Vec<(TimeWindow, Vec<MatchPair>)> {
        self.windows
    }
}

impl MatchSink for MemorySink {
    fn write(&mut self, window: &TimeWindow, pairs: &[MatchPair]) -> Result<()> {
        self.windows.push((*window, pairs.to_vec()));
        Ok(())
    }
}
