//! Throw-away datasets for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use pvmapper_core::{AnalysisMeta, Feature, FeatureCollection, PatchKey, RadiometricFrame};
use pvmapper_io::{write_radiometric, DatasetLayout};
use serde_json::json;
use serde_pickle::{HashableValue, SerOptions, Value};
use tempfile::TempDir;

/// Raw sensor value of roughly 0 °C.
pub const RAW_COLD: u16 = 6829;
/// Raw sensor value of roughly 80 °C.
pub const RAW_HOT: u16 = 8829;

pub const T1_PATCHES: [&str; 2] = [
    "frame_000001_mask_000000.tiff",
    "frame_000002_mask_000003.tiff",
];
pub const T1_QUAD: [(i32, i32); 4] = [(2, 2), (10, 2), (10, 8), (2, 8)];

pub struct TestDataset {
    dir: TempDir,
}

impl TestDataset {
    /// Empty dataset with all required subdirectories.
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        for sub in [
            "mapping",
            "patches",
            "patches_final/radiometric",
            "splitted/radiometric",
            "analyses",
        ] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        Self { dir }
    }

    /// Two modules, `T1` with two patches and `T2` with one, and one analysis `A`.
    pub fn standard() -> Self {
        let dataset = Self::new();
        dataset.write_layout(&[point("T1", 0.0, 0.0), point("T2", 0.00001, 0.0)]);

        dataset.write_patch("T1", T1_PATCHES[0], &uniform(16, 16, 7829));
        dataset.write_patch("T1", T1_PATCHES[1], &uniform(16, 16, 7879));
        dataset.write_patch("T2", "frame_000002_mask_000001.tiff", &uniform(16, 16, 7854));
        dataset.write_source_frame(1, &split_frame(16, 12));
        dataset.write_source_frame(2, &split_frame(16, 12));
        dataset.write_patch_meta(&[
            (PatchKey::new("T1", "frame_000001", "mask_000000"), T1_QUAD),
            (
                PatchKey::new("T1", "frame_000002", "mask_000003"),
                [(1, 1), (5, 1), (5, 5), (1, 5)],
            ),
            (
                PatchKey::new("T2", "frame_000002", "mask_000001"),
                [(8, 3), (14, 3), (14, 9), (8, 9)],
            ),
        ]);

        let mut a1 = point("T1", 0.0, 0.0);
        a1.set_property("mean_temp", 41.0);
        a1.set_property("max_temp", 44.0);
        let mut a2 = point("T2", 0.00001, 0.0);
        a2.set_property("mean_temp", None::<f64>);
        dataset.write_analysis("A", &[a1, a2], &AnalysisMeta::module_temperatures(5, 7.0));
        dataset
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn layout(&self) -> DatasetLayout {
        DatasetLayout::new(self.dir.path())
    }

    pub fn write_layout(&self, features: &[Feature]) {
        let collection = FeatureCollection::new(features.to_vec());
        let text = serde_json::to_string(&collection).unwrap();
        std::fs::write(self.layout().module_layout_path(), text).unwrap();
    }

    pub fn write_analysis(&self, name: &str, features: &[Feature], meta: &AnalysisMeta) {
        let layout = self.layout();
        std::fs::create_dir_all(layout.analysis_dir(name)).unwrap();
        let collection = FeatureCollection::new(features.to_vec());
        std::fs::write(
            layout.results_path(name),
            serde_json::to_string(&collection).unwrap(),
        )
        .unwrap();
        std::fs::write(layout.meta_path(name), serde_json::to_string(meta).unwrap()).unwrap();
    }

    pub fn write_patch_meta(&self, entries: &[(PatchKey, [(i32, i32); 4])]) {
        let mut dict = BTreeMap::new();
        for (key, quad) in entries {
            let key = HashableValue::Tuple(vec![
                HashableValue::String(key.track_id.clone()),
                HashableValue::String(key.frame_name.clone()),
                HashableValue::String(key.mask_name.clone()),
            ]);
            let points = quad
                .iter()
                .map(|&(x, y)| Value::List(vec![Value::I64(x.into()), Value::I64(y.into())]))
                .collect();
            let mut fields = BTreeMap::new();
            fields.insert(
                HashableValue::String("quadrilateral".to_string()),
                Value::List(points),
            );
            dict.insert(key, Value::Dict(fields));
        }
        let bytes = serde_pickle::value_to_vec(&Value::Dict(dict), SerOptions::new()).unwrap();
        std::fs::write(self.layout().patch_meta_path(), bytes).unwrap();
    }

    pub fn write_patch(&self, track_id: &str, name: &str, patch: &RadiometricFrame) {
        let dir = self.layout().patch_dir(track_id);
        std::fs::create_dir_all(&dir).unwrap();
        write_radiometric(&dir.join(name), patch).unwrap();
    }

    pub fn write_source_frame(&self, index: u32, frame: &RadiometricFrame) {
        write_radiometric(&self.layout().source_frame_path(index), frame).unwrap();
    }
}

pub fn point(track_id: &str, lon: f64, lat: f64) -> Feature {
    Feature::new(track_id, json!({"type": "Point", "coordinates": [lon, lat]}))
}

pub fn uniform(width: usize, height: usize, raw: u16) -> RadiometricFrame {
    RadiometricFrame::new(width, height, vec![raw; width * height]).unwrap()
}

/// Cold left half, hot right half.
pub fn split_frame(width: usize, height: usize) -> RadiometricFrame {
    let data = (0..width * height)
        .map(|i| if i % width < width / 2 { RAW_COLD } else { RAW_HOT })
        .collect();
    RadiometricFrame::new(width, height, data).unwrap()
}
