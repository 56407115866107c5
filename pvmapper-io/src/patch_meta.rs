//! Patch metadata (`patches/meta.pkl`).
//!
//! The file is a pickled dict keyed by `(track_id, frame_name, mask_name)`
//! tuples. Each value is a dict with at least a `"quadrilateral"` entry
//! holding four `[x, y]` pixel corners in source-frame space.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use pvmapper_core::{Error as CoreError, PatchKey, Quadrilateral};
use serde_pickle::{DeOptions, HashableValue, Value};

use crate::{Error, Result};

/// Quadrilaterals of all stored detection patches. Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct GeometryStore {
    quads: HashMap<PatchKey, Quadrilateral>,
}

impl GeometryStore {
    /// Loads patch metadata from a pickle file.
    ///
    /// Entries with an unexpected key or quadrilateral shape are skipped
    /// with a warning.
    ///
    /// # Errors
    /// Returns `NotFound` if the file is missing, or an error if it is not a
    /// pickled dict.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::at_path(e, path))?;
        let store = Self::from_reader(BufReader::new(file))?;
        log::info!("loaded {} patch quadrilaterals from {}", store.len(), path.display());
        Ok(store)
    }

    /// Decodes patch metadata from a pickle stream.
    ///
    /// # Errors
    /// Returns an error if the stream is not a pickled dict.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let value = serde_pickle::value_from_reader(reader, DeOptions::new())?;
        let Value::Dict(entries) = value else {
            return Err(Error::Core(CoreError::MalformedData(
                "patch metadata is not a dict".to_string(),
            )));
        };

        let mut quads = HashMap::with_capacity(entries.len());
        for (key, entry) in &entries {
            match (parse_key(key), parse_quadrilateral(entry)) {
                (Ok(key), Ok(quad)) => {
                    quads.insert(key, quad);
                }
                (Err(e), _) | (_, Err(e)) => log::warn!("skipping patch metadata entry: {e}"),
            }
        }
        Ok(Self { quads })
    }

    /// Builds a store from already decoded entries.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = (PatchKey, Quadrilateral)>) -> Self {
        Self {
            quads: entries.into_iter().collect(),
        }
    }

    /// Quadrilateral of a patch.
    ///
    /// # Errors
    /// Returns `NotFound` if the key is not stored.
    pub fn get(&self, key: &PatchKey) -> std::result::Result<&Quadrilateral, CoreError> {
        self.quads
            .get(key)
            .ok_or_else(|| CoreError::NotFound(format!("patch metadata for {key}")))
    }

    /// Number of stored patches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quads.len()
    }

    /// Returns true if no patches are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
    }

    /// Iterates over all stored patches.
    pub fn iter(&self) -> impl Iterator<Item = (&PatchKey, &Quadrilateral)> {
        self.quads.iter()
    }
}

fn malformed(msg: String) -> CoreError {
    CoreError::MalformedData(msg)
}

fn parse_key(key: &HashableValue) -> std::result::Result<PatchKey, CoreError> {
    let HashableValue::Tuple(parts) = key else {
        return Err(malformed(format!("key {key:?} is not a tuple")));
    };
    let strings: Vec<&str> = parts
        .iter()
        .filter_map(|part| match part {
            HashableValue::String(s) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    match strings.as_slice() {
        [track_id, frame_name, mask_name] if parts.len() == 3 => {
            Ok(PatchKey::new(*track_id, *frame_name, *mask_name))
        }
        _ => Err(malformed(format!("key {key:?} is not a 3-tuple of strings"))),
    }
}

fn parse_quadrilateral(entry: &Value) -> std::result::Result<Quadrilateral, CoreError> {
    let Value::Dict(fields) = entry else {
        return Err(malformed("entry is not a dict".to_string()));
    };
    let quad = fields
        .get(&HashableValue::String("quadrilateral".to_string()))
        .ok_or_else(|| malformed("entry has no quadrilateral".to_string()))?;
    let points = sequence(quad)
        .ok_or_else(|| malformed("quadrilateral is not a list".to_string()))?
        .iter()
        .map(parse_point)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Quadrilateral::from_points(&points)
}

fn parse_point(value: &Value) -> std::result::Result<(i32, i32), CoreError> {
    match sequence(value) {
        Some([x, y]) => Ok((coordinate(x)?, coordinate(y)?)),
        _ => Err(malformed(format!("point {value:?} is not an [x, y] pair"))),
    }
}

fn sequence(value: &Value) -> Option<&[Value]> {
    match value {
        Value::List(items) | Value::Tuple(items) => Some(items),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn coordinate(value: &Value) -> std::result::Result<i32, CoreError> {
    match value {
        Value::I64(v) => i32::try_from(*v).map_err(|_| malformed(format!("coordinate {v} out of range"))),
        Value::F64(v) if v.is_finite() && v.abs() < f64::from(i32::MAX) => Ok(v.round() as i32),
        other => Err(malformed(format!("coordinate {other:?} is not a number"))),
    }
}
