//! Data access abstraction.
//!
//! A data source returns the observations of one instrument or dataset that
//! fall inside a time window. Readers for concrete file formats (HDF, NetCDF,
//! GRIB, CSV exports) implement [`DataSource`] outside this crate and convert
//! their arrays into a [`PointSeries`] at ingestion.

use crate::error::{ColocateError, Result};
use colocate_types::series::PointSeries;
use colocate_types::window::TimeWindow;
use std::collections::BTreeSet;

/// Trait for observation providers
///
/// Implementations must be safe to call from several threads at once, one
/// window per call, and must return `DataUnavailable` rather than an empty
/// series when nothing exists for a window.
pub trait DataSource: Send + Sync {
    /// Identifier used in logs and errors
    fn name(&self) -> &str;

    /// Observations inside `window`
    fn fetch(&self, window: &TimeWindow) -> Result<PointSeries>;

    /// Every variable name this source can provide, when known up front.
    ///
    /// A single window may carry only some of them (a cloudy day has no
    /// aerosol retrievals). `None` means the schema is only discovered from
    /// the data.
    fn variables(&self) -> Option<&BTreeSet<String>> {
        None
    }
}

impl<T: DataSource + ?Sized> DataSource for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, window: &TimeWindow) -> Result<PointSeries> {
        (**self).fetch(window)
    }

    fn variables(&self) -> Option<&BTreeSet<String>> {
        (**self).variables()
    }
}

impl<T: DataSource + ?Sized> DataSource for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch(&self, window: &TimeWindow) -> Result<PointSeries> {
        (**self).fetch(window)
    }

    fn variables(&self) -> Option<&BTreeSet<String>> {
        (**self).variables()
    }
}

/// In-memory source slicing a preloaded series by window
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    series: PointSeries,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, series: PointSeries) -> Self {
        Self {
            name: name.into(),
            series,
        }
    }

    pub fn series(&self) -> &PointSeries {
        &self.series
    }
}

impl DataSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, window: &TimeWindow) -> Result<PointSeries> {
        let slice = self.series.slice_window(window);
        if slice.is_empty() {
            return Err(ColocateError::DataUnavailable {
                source_id: self.name.clone(),
                window: *window,
            });
        }
        Ok(slice)
    }

    fn variables(&self) -> Option<&BTreeSet<String>> {
        Some(self.series.variables())
    }
}

/// Source backed by a closure, for wrapping file readers.
///
/// ```
/// use colocate::source::{DataSource, FnSource};
/// use colocate::{ColocateError, PointSeries, TimeWindow};
///
/// let reader = FnSource::new("seviri", |window: &TimeWindow| {
///     Err(ColocateError::DataUnavailable {
///         source_id: "seviri".to_string(),
///         window: *window,
///     })
/// });
/// assert_eq!(reader.name(), "seviri");
/// ```
pub struct FnSource<F> {
    name: String,
    fetch: F,
    variables: Option<BTreeSet<String>>,
}

impl<F> FnSource<F>
where
    F: Fn(&TimeWindow) -> Result<PointSeries> + Send + Sync,
{
    pub fn new(name: impl Into<String>, fetch: F) -> Self {
        Self {
            name: name.into(),
            fetch,
            variables: None,
        }
    }

    /// Declare the variables the wrapped reader produces.
    pub fn with_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables = Some(variables.into_iter().map(Into::into).collect());
        self
    }
}

impl<F> DataSource for FnSource<F>
where
    F: Fn(&TimeWindow) -> Result<PointSeries> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, window: &TimeWindow) -> Result<PointSeries> {
        (self.fetch)(window)
    }

    fn variables(&self) -> Option<&BTreeSet<String>> {
        self.variables.as_ref()
    }
}

impl<F> std::fmt::Debug for FnSource<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSource")
            .field("name", &self.name)
            .field("variables", &self.variables)
            .finish()
    }
}
