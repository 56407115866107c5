//! Attribute columns of a feature collection.

use std::collections::{BTreeMap, BTreeSet};

use pvmapper_core::{FeatureCollection, PropertyValue, TRACK_ID_KEY};

/// Values of one property keyed by track id.
///
/// Explicit nulls are stored as `Number(NaN)`; features without the
/// property have no entry.
pub type Column = BTreeMap<String, PropertyValue>;

/// Sorted, de-duplicated property names over all features, without `track_id`.
#[must_use]
pub fn column_names(features: &FeatureCollection) -> Vec<String> {
    features
        .features
        .iter()
        .flat_map(|f| f.properties.keys())
        .filter(|key| key.as_str() != TRACK_ID_KEY)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .cloned()
        .collect()
}

/// Projects property `name` of every feature onto its track id.
///
/// Features without a track id are skipped with a warning.
#[must_use]
pub fn project_column(features: &FeatureCollection, name: &str) -> Column {
    let mut column = Column::new();
    for feature in &features.features {
        let Some(value) = feature.property(name) else {
            continue;
        };
        let Some(track_id) = feature.track_id() else {
            log::warn!("feature without {TRACK_ID_KEY} skipped in column {name:?}");
            continue;
        };
        let value = if value.is_null() {
            PropertyValue::Number(f64::NAN)
        } else {
            value.clone()
        };
        column.insert(track_id.to_string(), value);
    }
    column
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvmapper_core::Feature;
    use serde_json::Value;

    fn collection() -> FeatureCollection {
        let mut a = Feature::new("A", Value::Null);
        a.set_property("mean_temp", 41.5);
        a.set_property("status", "ok");
        let mut b = Feature::new("B", Value::Null);
        b.set_property("mean_temp", None::<f64>);
        let mut c = Feature::new("C", Value::Null);
        c.set_property("max_temp", 50.0);
        FeatureCollection::new(vec![a, b, c])
    }

    #[test]
    fn test_column_names_sorted_without_track_id() {
        let features = collection();
        let names = column_names(&features);
        assert_eq!(names, vec!["max_temp", "mean_temp", "status"]);
        assert_eq!(column_names(&features), names);
    }

    #[test]
    fn test_missing_skipped_and_null_is_nan() {
        let column = project_column(&collection(), "mean_temp");
        assert_eq!(column.len(), 2);
        assert_eq!(column["A"].as_f64(), Some(41.5));
        assert!(column["B"].is_nan());
        assert!(!column.contains_key("C"));
    }

    #[test]
    fn test_feature_without_track_id_is_skipped() {
        let mut orphan = Feature::new("X", Value::Null);
        orphan.properties.remove(TRACK_ID_KEY);
        orphan.set_property("mean_temp", 1.0);
        let column = project_column(&FeatureCollection::new(vec![orphan]), "mean_temp");
        assert!(column.is_empty());
    }
}
