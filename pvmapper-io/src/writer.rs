//! Writers for analysis result sets.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use pvmapper_core::{AnalysisMeta, Error as CoreError, FeatureCollection};

use crate::layout::validate_analysis_name;
use crate::{DatasetLayout, Result};

/// Writer for one analysis result set.
///
/// Files are written into a hidden staging directory that is renamed to
/// `analyses/<name>` by [`commit`](ResultWriter::commit). Until then the
/// result set is never listed as a source. Dropping an uncommitted writer
/// removes the staging directory.
pub struct ResultWriter {
    staging: PathBuf,
    target: PathBuf,
    committed: bool,
}

impl ResultWriter {
    /// Creates the staging directory for analysis `name`.
    ///
    /// # Errors
    /// Returns `InvalidName` for unusable names, `NameConflict` if the
    /// analysis (or another writer for it) already exists, or an I/O error.
    pub fn create(layout: &DatasetLayout, name: &str) -> Result<Self> {
        validate_analysis_name(name)?;
        let target = layout.analysis_dir(name);
        let staging = layout.staging_dir(name);
        if target.exists() || staging.exists() {
            return Err(CoreError::NameConflict(name.to_string()).into());
        }
        std::fs::create_dir_all(layout.analyses_dir())?;
        std::fs::create_dir(&staging)?;
        Ok(Self {
            staging,
            target,
            committed: false,
        })
    }

    /// Writes `results.geojson`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write_results(&mut self, results: &FeatureCollection) -> Result<()> {
        write_json(&self.staging.join("results.geojson"), results)
    }

    /// Writes `meta.json`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn write_meta(&mut self, meta: &AnalysisMeta) -> Result<()> {
        write_json(&self.staging.join("meta.json"), meta)
    }

    /// Moves the staged files into place and returns the final directory.
    ///
    /// # Errors
    /// Returns `NameConflict` if the target appeared meanwhile, or an I/O error.
    pub fn commit(mut self) -> Result<PathBuf> {
        if self.target.exists() {
            let name = self
                .target
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Err(CoreError::NameConflict(name).into());
        }
        std::fs::rename(&self.staging, &self.target)?;
        self.committed = true;
        Ok(self.target.clone())
    }

    /// Discards everything written so far.
    pub fn abort(self) {
        drop(self);
    }
}

impl Drop for ResultWriter {
    fn drop(&mut self) {
        if !self.committed {
            if let Err(e) = std::fs::remove_dir_all(&self.staging) {
                log::warn!("failed to remove {}: {e}", self.staging.display());
            }
        }
    }
}

fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer(&mut writer, value).map_err(CoreError::from)?;
    writer.flush()?;
    Ok(())
}

/// Removes an analysis directory. A missing directory is not an error.
///
/// # Errors
/// Returns `InvalidName` for unusable names, or an I/O error.
pub fn remove_analysis(layout: &DatasetLayout, name: &str) -> Result<()> {
    validate_analysis_name(name)?;
    let dir = layout.analysis_dir(name);
    log::info!("deleting {}", dir.display());
    match std::fs::remove_dir_all(&dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
