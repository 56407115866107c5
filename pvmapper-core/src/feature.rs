//! GeoJSON feature model.
//!
//! Feature properties are a bag of dynamically typed values. Each value is
//! kept as a [`PropertyValue`] so that numbers, strings and explicit nulls
//! stay distinguishable until a numeric column is extracted.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Reserved property holding the stable module identifier.
pub const TRACK_ID_KEY: &str = "track_id";

fn feature_type() -> String {
    "Feature".to_string()
}

/// GeoJSON allows `"properties": null`; it reads as an empty bag.
fn null_as_empty<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<String, PropertyValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

/// A single property value of a feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Explicit JSON `null`.
    Null,
    /// Any JSON number.
    Number(f64),
    /// A JSON string.
    String(String),
    /// Booleans, arrays and objects, carried through untouched.
    Other(Value),
}

impl PropertyValue {
    /// Returns the numeric value, if this is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string value, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for an explicit null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Returns true for a number that is NaN.
    #[must_use]
    pub fn is_nan(&self) -> bool {
        matches!(self, PropertyValue::Number(v) if v.is_nan())
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<Option<f64>> for PropertyValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(PropertyValue::Null, PropertyValue::Number)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

/// One geolocated module record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// GeoJSON object type, always `"Feature"`.
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    /// Raw GeoJSON geometry.
    #[serde(default)]
    pub geometry: Value,
    /// Named properties, including the reserved `track_id`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub properties: BTreeMap<String, PropertyValue>,
    /// Any other members (`id`, `bbox`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Feature {
    /// Creates a feature with the given track id and geometry.
    #[must_use]
    pub fn new(track_id: &str, geometry: Value) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(TRACK_ID_KEY.to_string(), PropertyValue::from(track_id));
        Self {
            kind: feature_type(),
            geometry,
            properties,
            extra: Map::new(),
        }
    }

    /// Returns the module track id, if present and a string.
    #[must_use]
    pub fn track_id(&self) -> Option<&str> {
        self.properties.get(TRACK_ID_KEY).and_then(PropertyValue::as_str)
    }

    /// Sets a property, replacing any previous value.
    pub fn set_property(&mut self, name: &str, value: impl Into<PropertyValue>) {
        self.properties.insert(name.to_string(), value.into());
    }

    /// Returns a property value by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Mean of all coordinate pairs in the geometry, as `(lon, lat)`.
    ///
    /// Works for points, line strings and (multi-)polygons alike.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(&self) -> Option<(f64, f64)> {
        let mut sum = (0.0, 0.0);
        let mut count = 0usize;
        if let Some(coords) = self.geometry.get("coordinates") {
            accumulate_positions(coords, &mut sum, &mut count);
        }
        (count > 0).then(|| (sum.0 / count as f64, sum.1 / count as f64))
    }
}

fn accumulate_positions(value: &Value, sum: &mut (f64, f64), count: &mut usize) {
    let Value::Array(items) = value else {
        return;
    };
    if let (Some(x), Some(y)) = (
        items.first().and_then(Value::as_f64),
        items.get(1).and_then(Value::as_f64),
    ) {
        sum.0 += x;
        sum.1 += y;
        *count += 1;
        return;
    }
    for item in items {
        accumulate_positions(item, sum, count);
    }
}

/// An ordered collection of features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    /// GeoJSON object type, always `"FeatureCollection"`.
    #[serde(rename = "type", default = "feature_collection_type")]
    pub kind: String,
    /// Features in file order.
    #[serde(default)]
    pub features: Vec<Feature>,
    /// Any other members (`crs`, `name`, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for FeatureCollection {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl FeatureCollection {
    /// Creates a collection from features.
    #[must_use]
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: feature_collection_type(),
            features,
            extra: Map::new(),
        }
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns true if there are no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Track ids of all features that carry one, in file order.
    pub fn track_ids(&self) -> impl Iterator<Item = &str> {
        self.features.iter().filter_map(Feature::track_id)
    }

    /// Finds the feature with the given track id.
    #[must_use]
    pub fn find(&self, track_id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.track_id() == Some(track_id))
    }
}

/// Contents of an analysis `meta.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMeta {
    /// Analysis type tag, e.g. `"module_temperatures"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Analysis parameters and other free-form members.
    #[serde(flatten)]
    pub params: Map<String, Value>,
}

impl AnalysisMeta {
    /// Type tag written by the module temperature analysis.
    pub const MODULE_TEMPERATURES: &'static str = "module_temperatures";

    /// Creates metadata for a module temperature analysis.
    #[must_use]
    pub fn module_temperatures(border_margin: u32, neighbor_radius: f64) -> Self {
        let mut params = Map::new();
        params.insert("border_margin".to_string(), Value::from(border_margin));
        params.insert("neighbor_radius".to_string(), Value::from(neighbor_radius));
        Self {
            kind: Self::MODULE_TEMPERATURES.to_string(),
            params,
        }
    }

    /// Parses metadata from JSON text.
    ///
    /// # Errors
    /// Returns `MalformedData` if the text is not an object with a `type` field.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::MalformedData(format!("meta.json: {e}")))
    }

    /// Axis label for a colorbar showing this analysis' values.
    #[must_use]
    pub fn value_label(&self) -> &'static str {
        if self.kind == Self::MODULE_TEMPERATURES {
            "Temperatures / °C"
        } else {
            ""
        }
    }
}
