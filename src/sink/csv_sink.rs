//! CSV output, one file per window.

use super::MatchSink;
use crate::compute::temporal::Cadence;
use crate::config::Config;
use crate::error::{ColocateError, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use colocate_types::pair::MatchPair;
use colocate_types::point::{GeoPoint, Value};
use colocate_types::window::TimeWindow;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes each window's pairs to `<dir>/<prefix>_<label>.csv`.
///
/// Columns: `index, latitude, longitude, time, <variables of A>,
/// <variables of B>, latitude_b, longitude_b, time_b, distance_km,
/// time_delta_s`. Location and time columns without suffix belong to the
/// point of series A. A variable of B whose name is also a column of A gets
/// a `_b` suffix. Profiles are written as `;`-separated samples and missing
/// values as empty cells. Windows without pairs produce no file.
#[derive(Debug, Clone)]
pub struct CsvSink {
    dir: PathBuf,
    prefix: String,
    label_format: String,
    columns_a: Option<Vec<String>>,
    columns_b: Option<Vec<String>>,
    files_written: Vec<PathBuf>,
}

impl CsvSink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, cadence: Cadence) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            label_format: cadence.label_format().to_string(),
            columns_a: None,
            columns_b: None,
            files_written: Vec::new(),
        }
    }

    /// Sink writing under the configured `output_dir`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let dir = config.output_dir.clone().ok_or_else(|| {
            ColocateError::Config("output_dir is required for CSV output".to_string())
        })?;
        Ok(Self::new(dir, config.output_prefix.clone(), config.cadence))
    }

    /// Fix the variable columns instead of deriving them from each window's pairs.
    pub fn with_columns<A, B>(mut self, columns_a: A, columns_b: B) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        B: IntoIterator,
        B::Item: Into<String>,
    {
        self.columns_a = Some(columns_a.into_iter().map(Into::into).collect());
        self.columns_b = Some(columns_b.into_iter().map(Into::into).collect());
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, window: &TimeWindow) -> PathBuf {
        self.dir
            .join(format!("{}_{}.csv", self.prefix, window.label(&self.label_format)))
    }

    /// Files created so far, in write order.
    pub fn files_written(&self) -> &[PathBuf] {
        &self.files_written
    }
}

fn variable_union<'a, F>(pairs: &'a [MatchPair], side: F) -> Vec<String>
where
    F: Fn(&'a MatchPair) -> &'a GeoPoint,
{
    let names: BTreeSet<&String> = pairs.iter().flat_map(|p| side(p).values.keys()).collect();
    names.into_iter().cloned().collect()
}

fn format_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn cell(value: Option<&Value>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn header(columns_a: &[String], columns_b: &[String]) -> Vec<String> {
    let mut header: Vec<String> = ["index", "latitude", "longitude", "time"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    header.extend(columns_a.iter().cloned());
    header.extend(columns_b.iter().map(|name| {
        if columns_a.contains(name) {
            format!("{}_b", name)
        } else {
            name.clone()
        }
    }));
    header.extend(
        ["latitude_b", "longitude_b", "time_b", "distance_km", "time_delta_s"]
            .iter()
            .map(|s| s.to_string()),
    );
    header
}

impl MatchSink for CsvSink {
    fn write(&mut self, window: &TimeWindow, pairs: &[MatchPair]) -> Result<()> {
        if pairs.is_empty() {
            log::debug!("No pairs for window {}, skipping CSV output", window);
            return Ok(());
        }

        fs::create_dir_all(&self.dir)?;

        let columns_a = match &self.columns_a {
            Some(columns) => columns.clone(),
            None => variable_union(pairs, |p| &p.point_a),
        };
        let columns_b = match &self.columns_b {
            Some(columns) => columns.clone(),
            None => variable_union(pairs, |p| &p.point_b),
        };

        let path = self.path_for(window);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(header(&columns_a, &columns_b))?;

        for (index, pair) in pairs.iter().enumerate() {
            let a = &pair.point_a;
            let b = &pair.point_b;

            let mut record = Vec::with_capacity(9 + columns_a.len() + columns_b.len());
            record.push(index.to_string());
            record.push(a.latitude().to_string());
            record.push(a.longitude().to_string());
            record.push(format_time(a.time));
            record.extend(columns_a.iter().map(|name| cell(a.value(name))));
            record.extend(columns_b.iter().map(|name| cell(b.value(name))));
            record.push(b.latitude().to_string());
            record.push(b.longitude().to_string());
            record.push(format_time(b.time));
            record.push(pair.distance_km.to_string());
            record.push(pair.time_delta_seconds().to_string());

            writer.write_record(&record)?;
        }
        writer.flush()?;

        log::info!("Wrote {} pairs to {}", pairs.len(), path.display());
        self.files_written.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn window() -> TimeWindow {
        let start = Utc.with_ymd_and_hms(2020, 7, 14, 0, 0, 0).unwrap();
        TimeWindow::new(start, start + TimeDelta::days(1)).unwrap()
    }

    fn pairs() -> Vec<MatchPair> {
        let t = Utc.with_ymd_and_hms(2020, 7, 14, 13, 30, 0).unwrap();
        vec![
            MatchPair::new(
                GeoPoint::new(16.0, -23.0, t).with_value("aod", 0.41),
                GeoPoint::new(16.01, -23.01, t + TimeDelta::seconds(90))
                    .with_value("aod", 0.39)
                    .with_value("beta", vec![1.5, 0.25]),
                1.5,
                TimeDelta::seconds(90),
            ),
            MatchPair::new(
                GeoPoint::new(16.5, -22.5, t + TimeDelta::minutes(5)),
                GeoPoint::new(16.5, -22.5, t).with_value("aod", 0.2),
                0.0,
                TimeDelta::minutes(-5),
            ),
        ]
    }

    #[test]
    fn test_csv_sink_writes_one_file_per_window() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("matches");
        let mut sink = CsvSink::new(&out, "caliop_aeronet", Cadence::Daily);

        sink.write(&window(), &pairs()).unwrap();

        let path = out.join("caliop_aeronet_20200714.csv");
        assert_eq!(sink.files_written(), &[path.clone()]);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "index,latitude,longitude,time,aod,aod_b,beta,latitude_b,longitude_b,time_b,distance_km,time_delta_s"
        );
        assert_eq!(
            lines[1],
            "0,16,-23,2020-07-14T13:30:00Z,0.41,0.39,1.5;0.25,16.01,-23.01,2020-07-14T13:31:30Z,1.5,90"
        );
        assert_eq!(
            lines[2],
            "1,16.5,-22.5,2020-07-14T13:35:00Z,,0.2,,16.5,-22.5,2020-07-14T13:30:00Z,0,-300"
        );
    }

    #[test]
    fn test_csv_sink_fixed_columns() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvSink::new(dir.path(), "out", Cadence::Hourly)
            .with_columns(["aod"], ["beta", "missing"]);

        sink.write(&window(), &pairs()).unwrap();

        let path = dir.path().join("out_20200714_00.csv");
        let content = std::fs::read_to_string(path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(
            header,
            "index,latitude,longitude,time,aod,beta,missing,latitude_b,longitude_b,time_b,distance_km,time_delta_s"
        );
    }

    #[test]
    fn test_csv_sink_skips_empty_windows() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("never_created");
        let mut sink = CsvSink::new(&out, "x", Cadence::Daily);
        sink.write(&window(), &[]).unwrap();
        assert!(sink.files_written().is_empty());
        assert!(!out.exists());
    }

    #[test]
    fn test_csv_sink_from_config() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let config = Config::new(start, start);
        assert!(CsvSink::from_config(&config).is_err());

        let config = config.with_output_dir("/data/out").with_output_prefix("seviri");
        let sink = CsvSink::from_config(&config).unwrap();
        assert_eq!(sink.dir(), Path::new("/data/out"));
        assert_eq!(
            sink.path_for(&window()),
            PathBuf::from("/data/out/seviri_20200714.csv")
        );
    }
}
