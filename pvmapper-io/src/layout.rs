//! Dataset directory layout.
//!
//! ```text
//! <dataset>/
//!   mapping/module_geolocations_refined.geojson
//!   analyses/<name>/{results.geojson, meta.json}
//!   patches/meta.pkl
//!   patches_final/radiometric/<track_id>/*
//!   splitted/radiometric/frame_<6-digit index>.tiff
//! ```

use std::path::{Path, PathBuf};

use pvmapper_core::Error as CoreError;

use crate::{Error, Result};

/// Immediate subdirectories every dataset must have.
pub const REQUIRED_SUBDIRS: [&str; 4] = ["mapping", "patches", "patches_final", "splitted"];

/// Suffix of the hidden staging directory an analysis is written into.
pub(crate) const STAGING_SUFFIX: &str = ".partial";

/// Returns true if `dir` has all required immediate subdirectories.
#[must_use]
pub fn is_valid_dataset(dir: &Path) -> bool {
    REQUIRED_SUBDIRS.iter().all(|sub| dir.join(sub).is_dir())
}

/// Checks that `name` can be used as an analysis directory name.
///
/// # Errors
/// Returns `InvalidName` for empty names, names starting with `.` and names
/// containing path separators.
pub fn validate_analysis_name(name: &str) -> std::result::Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed != name
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains('\0')
    {
        return Err(CoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Paths inside one dataset directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    /// Creates a layout rooted at `root`. Nothing is checked on disk.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Dataset root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Base module layout feature collection.
    #[must_use]
    pub fn module_layout_path(&self) -> PathBuf {
        self.root
            .join("mapping")
            .join("module_geolocations_refined.geojson")
    }

    /// Directory holding all analysis result sets.
    #[must_use]
    pub fn analyses_dir(&self) -> PathBuf {
        self.root.join("analyses")
    }

    /// Directory of one analysis result set.
    #[must_use]
    pub fn analysis_dir(&self, name: &str) -> PathBuf {
        self.analyses_dir().join(name)
    }

    /// Hidden directory an analysis is staged in while it is being written.
    #[must_use]
    pub fn staging_dir(&self, name: &str) -> PathBuf {
        self.analyses_dir().join(format!(".{name}{STAGING_SUFFIX}"))
    }

    /// `results.geojson` of an analysis.
    #[must_use]
    pub fn results_path(&self, name: &str) -> PathBuf {
        self.analysis_dir(name).join("results.geojson")
    }

    /// `meta.json` of an analysis.
    #[must_use]
    pub fn meta_path(&self, name: &str) -> PathBuf {
        self.analysis_dir(name).join("meta.json")
    }

    /// Serialized patch metadata.
    #[must_use]
    pub fn patch_meta_path(&self) -> PathBuf {
        self.root.join("patches").join("meta.pkl")
    }

    /// Radiometric detection patches of one module.
    #[must_use]
    pub fn patch_dir(&self, track_id: &str) -> PathBuf {
        self.root
            .join("patches_final")
            .join("radiometric")
            .join(track_id)
    }

    /// Full radiometric source frame by index.
    #[must_use]
    pub fn source_frame_path(&self, frame_index: u32) -> PathBuf {
        self.root
            .join("splitted")
            .join("radiometric")
            .join(format!("frame_{frame_index:06}.tiff"))
    }

    /// Sorted names of the analysis result sets on disk.
    ///
    /// Hidden entries (including staging directories) and names that are not
    /// valid analysis names are skipped. A missing `analyses/` directory
    /// yields an empty list.
    ///
    /// # Errors
    /// Returns an error if the directory exists but cannot be read.
    pub fn list_analyses(&self) -> Result<Vec<String>> {
        let dir = self.analyses_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Io(e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                log::warn!("skipping non UTF-8 analysis directory {:?}", entry.path());
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if validate_analysis_name(&name).is_err() {
                log::warn!("skipping analysis directory with unusable name {name:?}");
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }
}
