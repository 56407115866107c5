//! Readers for feature collections and analysis metadata.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use pvmapper_core::{AnalysisMeta, Error as CoreError, FeatureCollection, MODULE_LAYOUT};

use crate::layout::validate_analysis_name;
use crate::{DatasetLayout, Error, Result};

/// Reads a GeoJSON feature collection.
///
/// # Errors
/// Returns `NotFound` if the file is missing and `MalformedData` if it is
/// not a feature collection.
pub fn read_feature_collection(path: &Path) -> Result<FeatureCollection> {
    let file = File::open(path).map_err(|e| Error::at_path(e, path))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        Error::Core(CoreError::MalformedData(format!("{}: {e}", path.display())))
    })
}

/// Reads an analysis `meta.json`.
///
/// # Errors
/// Returns `NotFound` if the file is missing and `MalformedData` if it
/// lacks a `type` field.
pub fn read_meta(path: &Path) -> Result<AnalysisMeta> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::at_path(e, path))?;
    Ok(AnalysisMeta::from_json(&text)?)
}

/// Loads the feature collection and metadata of a named source.
///
/// `"Module Layout"` reads the base layout and has no metadata; any other
/// name needs a complete `results.geojson` + `meta.json` pair.
///
/// # Errors
/// Returns `NotFound` for unknown names or incomplete result sets.
pub fn load_source(
    layout: &DatasetLayout,
    name: &str,
) -> Result<(FeatureCollection, Option<AnalysisMeta>)> {
    if name == MODULE_LAYOUT {
        let features = read_feature_collection(&layout.module_layout_path())?;
        return Ok((features, None));
    }

    if validate_analysis_name(name).is_err() {
        return Err(Error::Core(CoreError::NotFound(format!("source {name:?}"))));
    }
    let results = layout.results_path(name);
    let meta = layout.meta_path(name);
    if !results.is_file() || !meta.is_file() {
        return Err(Error::Core(CoreError::NotFound(format!("source {name:?}"))));
    }
    let features = read_feature_collection(&results)?;
    let meta = read_meta(&meta)?;
    Ok((features, Some(meta)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layout_with_mapping(dir: &TempDir) -> DatasetLayout {
        let layout = DatasetLayout::new(dir.path());
        std::fs::create_dir_all(dir.path().join("mapping")).unwrap();
        std::fs::write(
            layout.module_layout_path(),
            r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":null,"properties":{"track_id":"T1"}}]}"#,
        )
        .unwrap();
        layout
    }

    #[test]
    fn test_module_layout_has_no_meta() {
        let dir = TempDir::new().unwrap();
        let layout = layout_with_mapping(&dir);
        let (features, meta) = load_source(&layout, MODULE_LAYOUT).unwrap();
        assert_eq!(features.len(), 1);
        assert!(meta.is_none());
    }

    #[test]
    fn test_analysis_needs_both_files() {
        let dir = TempDir::new().unwrap();
        let layout = layout_with_mapping(&dir);
        std::fs::create_dir_all(layout.analysis_dir("A")).unwrap();
        std::fs::write(layout.results_path("A"), r#"{"type":"FeatureCollection","features":[]}"#)
            .unwrap();

        let err = pvmapper_core::Error::from(load_source(&layout, "A").unwrap_err());
        assert!(err.is_not_found());

        std::fs::write(layout.meta_path("A"), r#"{"type":"module_temperatures"}"#).unwrap();
        let (_, meta) = load_source(&layout, "A").unwrap();
        assert_eq!(meta.unwrap().kind, "module_temperatures");
    }

    #[test]
    fn test_hidden_and_traversal_names_rejected() {
        let dir = TempDir::new().unwrap();
        let layout = layout_with_mapping(&dir);
        assert!(load_source(&layout, ".A.partial").is_err());
        assert!(load_source(&layout, "../mapping").is_err());
    }

    #[test]
    fn test_null_properties_do_not_fail_the_collection() {
        let dir = TempDir::new().unwrap();
        let layout = layout_with_mapping(&dir);
        std::fs::write(
            layout.module_layout_path(),
            r#"{"type":"FeatureCollection","features":[
                {"type":"Feature","geometry":null,"properties":{"track_id":"T1"}},
                {"type":"Feature","geometry":null,"properties":null}
            ]}"#,
        )
        .unwrap();

        let (features, _) = load_source(&layout, MODULE_LAYOUT).unwrap();
        assert_eq!(features.len(), 2);
        assert!(features.features[1].properties.is_empty());
        assert_eq!(features.track_ids().collect::<Vec<_>>(), vec!["T1"]);
    }

    #[test]
    fn test_malformed_geojson() {
        let dir = TempDir::new().unwrap();
        let layout = layout_with_mapping(&dir);
        std::fs::write(layout.module_layout_path(), "[1, 2").unwrap();
        let err = pvmapper_core::Error::from(load_source(&layout, MODULE_LAYOUT).unwrap_err());
        assert!(matches!(err, pvmapper_core::Error::MalformedData(_)));
    }
}
