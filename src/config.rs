//! Batch job configuration.
//!
//! Everything a colocation run depends on (date range, cadence, windows,
//! variables, source identifiers, output location) is carried here and
//! passed explicitly to the runner.
use crate::compute::spatial::DistanceMetric;
use crate::compute::temporal::{Cadence, Tiles, tile};
use crate::error::{ColocateError, Result};
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::Error;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Colocation job configuration
///
/// # Example
///
/// ```rust
/// use colocate::{Cadence, Config};
///
/// let json = r#"{
///     "start": "2020-06-01T00:00:00Z",
///     "end": "2020-06-30T00:00:00Z",
///     "cadence": "daily",
///     "spatial_window_km": 40.0,
///     "temporal_window_seconds": 1800,
///     "variables": ["aod_532", "aod_500"],
///     "source_a": "caliop",
///     "source_b": "aeronet"
/// }"#;
/// let config = Config::from_json(json).unwrap();
/// assert_eq!(config.cadence, Cadence::Daily);
/// assert_eq!(config.windows().unwrap().len(), 30);
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub start: DateTime<Utc>,

    pub end: DateTime<Utc>,

    #[serde(default)]
    pub cadence: Cadence,

    /// Maximum great-circle distance between matched points
    #[serde(default = "Config::default_spatial_window_km")]
    pub spatial_window_km: f64,

    /// Maximum absolute time offset between matched points, in seconds
    /// with millisecond resolution
    #[serde(default = "Config::default_temporal_window_seconds")]
    pub temporal_window_seconds: f64,

    /// Variables copied into matched pairs
    #[serde(default)]
    pub variables: BTreeSet<String>,

    #[serde(default)]
    pub metric: DistanceMetric,

    #[serde(default = "Config::default_source_a")]
    pub source_a: String,

    #[serde(default = "Config::default_source_b")]
    pub source_b: String,

    /// Directory receiving one output file per window
    #[serde(default)]
    pub output_dir: Option<PathBuf>,

    #[serde(default = "Config::default_output_prefix")]
    pub output_prefix: String,
}

impl Config {
    const fn default_spatial_window_km() -> f64 {
        50.0
    }

    const fn default_temporal_window_seconds() -> f64 {
        3600.0
    }

    fn default_source_a() -> String {
        "a".to_string()
    }

    fn default_source_b() -> String {
        "b".to_string()
    }

    fn default_output_prefix() -> String {
        "colocation".to_string()
    }

    /// Daily job over `[start, end]` with default windows.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            cadence: Cadence::default(),
            spatial_window_km: Self::default_spatial_window_km(),
            temporal_window_seconds: Self::default_temporal_window_seconds(),
            variables: BTreeSet::new(),
            metric: DistanceMetric::default(),
            source_a: Self::default_source_a(),
            source_b: Self::default_source_b(),
            output_dir: None,
            output_prefix: Self::default_output_prefix(),
        }
    }

    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn with_spatial_window_km(mut self, km: f64) -> Self {
        self.spatial_window_km = km;
        self
    }

    /// Sub-millisecond parts of `window` are dropped.
    pub fn with_temporal_window(mut self, window: TimeDelta) -> Self {
        self.temporal_window_seconds = window.num_milliseconds() as f64 / 1000.0;
        self
    }

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

    pub fn with_sources(mut self, source_a: impl Into<String>, source_b: impl Into<String>) -> Self {
        self.source_a = source_a.into();
        self.source_b = source_b.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_output_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.output_prefix = prefix.into();
        self
    }

    /// Temporal matching tolerance as a duration, rounded to the millisecond.
    pub fn temporal_window(&self) -> TimeDelta {
        let millis = (self.temporal_window_seconds * 1000.0).round();
        if millis >= i64::MAX as f64 {
            return TimeDelta::MAX;
        }
        TimeDelta::try_milliseconds(millis as i64).unwrap_or(TimeDelta::MAX)
    }

    /// Windows covering the configured range.
    pub fn windows(&self) -> Result<Tiles> {
        tile(self.start, self.end, self.cadence.step())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.start > self.end {
            return Err(ColocateError::InvalidRange {
                start: self.start,
                end: self.end,
            });
        }

        if self.cadence == Cadence::Minutes(0) {
            return Err(ColocateError::InvalidStep(
                "cadence must be at least one minute".to_string(),
            ));
        }

        if !self.spatial_window_km.is_finite() || self.spatial_window_km < 0.0 {
            return Err(ColocateError::Config(format!(
                "spatial_window_km must be finite and non-negative, got {}",
                self.spatial_window_km
            )));
        }

        if !self.temporal_window_seconds.is_finite() || self.temporal_window_seconds < 0.0 {
            return Err(ColocateError::Config(format!(
                "temporal_window_seconds must be finite and non-negative, got {}",
                self.temporal_window_seconds
            )));
        }

        if self.source_a.trim().is_empty() || self.source_b.trim().is_empty() {
            return Err(ColocateError::Config(
                "source identifiers must not be empty".to_string(),
            ));
        }

        if self.output_prefix.contains(std::path::is_separator) {
            return Err(ColocateError::Config(format!(
                "output_prefix must not contain path separators: {}",
                self.output_prefix
            )));
        }

        if let Some(name) = self.variables.iter().find(|v| v.trim().is_empty()) {
            return Err(ColocateError::Config(format!(
                "variable names must not be blank: {:?}",
                name
            )));
        }

        Ok(())
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(serde_json::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as JSON string
    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load configuration from TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    /// Save configuration as TOML string (requires toml feature)
    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
