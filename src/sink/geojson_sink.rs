//! GeoJSON conversion for matched pairs.

use super::MatchSink;
use crate::error::{ColocateError, Result};
use chrono::SecondsFormat;
use colocate_types::pair::MatchPair;
use colocate_types::point::{GeoPoint, Value as ObsValue};
use colocate_types::window::TimeWindow;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use std::fs;
use std::path::{Path, PathBuf};

fn obs_to_json(value: &ObsValue) -> JsonValue {
    match value {
        ObsValue::Scalar(v) => JsonValue::from(*v),
        ObsValue::Profile(samples) => JsonValue::from(samples.to_vec()),
    }
}

fn insert_point_properties(props: &mut JsonObject, suffix: &str, point: &GeoPoint) {
    props.insert(
        format!("time_{}", suffix),
        JsonValue::from(point.time.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    );
    for (name, value) in point.values() {
        props.insert(format!("{}_{}", name, suffix), obs_to_json(value));
    }
}

/// Converts a pair to a LineString feature from the point of A to the point of B.
///
/// Properties hold the distance, the signed time offset in seconds, both
/// timestamps and every copied variable suffixed with `_a` or `_b`.
pub fn pair_to_feature(pair: &MatchPair) -> Feature {
    let a = &pair.point_a;
    let b = &pair.point_b;
    let geometry = Geometry::new(Value::LineString(vec![
        vec![a.longitude(), a.latitude()],
        vec![b.longitude(), b.latitude()],
    ]));

    let mut props = JsonObject::new();
    props.insert("distance_km".to_string(), JsonValue::from(pair.distance_km));
    props.insert(
        "time_delta_s".to_string(),
        JsonValue::from(pair.time_delta_seconds()),
    );
    insert_point_properties(&mut props, "a", a);
    insert_point_properties(&mut props, "b", b);

    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties: Some(props),
        foreign_members: None,
    }
}

pub fn pairs_to_feature_collection<'a, I>(pairs: I) -> FeatureCollection
where
    I: IntoIterator<Item = &'a MatchPair>,
{
    FeatureCollection {
        bbox: None,
        features: pairs.into_iter().map(pair_to_feature).collect(),
        foreign_members: None,
    }
}

/// Collects every window's pairs and writes a single FeatureCollection on `finish`.
#[derive(Debug, Clone)]
pub struct GeoJsonSink {
    path: PathBuf,
    features: Vec<Feature>,
}

impl GeoJsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            features: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }
}

impl MatchSink for GeoJsonSink {
    fn write(&mut self, window: &TimeWindow, pairs: &[MatchPair]) -> Result<()> {
        log::debug!("Buffering {} features for window {}", pairs.len(), window);
        self.features.extend(pairs.iter().map(pair_to_feature));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let collection = FeatureCollection {
            bbox: None,
            features: std::mem::take(&mut self.features),
            foreign_members: None,
        };
        let json = serde_json::to_string(&collection).map_err(|e| {
            ColocateError::SerializationErrorWithContext(format!(
                "Failed to serialize feature collection: {}",
                e
            ))
        })?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, json)?;
        log::info!(
            "Wrote {} features to {}",
            collection.features.len(),
            self.path.display()
        );
        Ok(())
    }
}
