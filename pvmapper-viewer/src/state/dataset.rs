//! The dataset model: lifecycle, sources and selection.

use std::path::Path;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use pvmapper_core::{AnalysisMeta, Error, FeatureCollection, Result, MODULE_LAYOUT};
use pvmapper_io::{list_patch_files, load_source, remove_analysis, DatasetLayout, GeometryStore};

use super::events::{DatasetEvent, EventBus};
use crate::viewer::{column_names, project_column, Column};

/// The selected source: its features and metadata, always replaced together.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveSource {
    /// Source name, `"Module Layout"` or an analysis name.
    pub name: String,
    /// Feature collection of the source.
    pub features: FeatureCollection,
    /// Metadata of a computed analysis; `None` for the module layout.
    pub meta: Option<AnalysisMeta>,
}

/// Everything that only exists while a dataset is open.
struct OpenDataset {
    layout: DatasetLayout,
    geometry: Arc<GeometryStore>,
    source_names: Vec<String>,
    active: Option<Arc<ActiveSource>>,
}

/// Owner of the open dataset and the current selection.
///
/// There is one model per inspector; consumers get it by reference and
/// observe changes through [`subscribe`](DatasetModel::subscribe).
#[derive(Default)]
pub struct DatasetModel {
    dataset: Option<OpenDataset>,
    selected_column: Option<usize>,
    selected_track: Option<String>,
    patch_index: usize,
    events: EventBus,
}

impl DatasetModel {
    /// Creates a closed model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an observer of model changes.
    pub fn subscribe(&mut self) -> Receiver<DatasetEvent> {
        self.events.subscribe()
    }

    /// Opens the dataset at `directory`, replacing any open one.
    ///
    /// Loads the patch metadata, enumerates sources and selects
    /// `"Module Layout"`. Nothing changes if any step fails.
    ///
    /// # Errors
    /// Returns `NotFound` if the patch metadata or module layout is absent,
    /// or `MalformedData` if either cannot be decoded.
    pub fn open(&mut self, directory: impl AsRef<Path>) -> Result<()> {
        let layout = DatasetLayout::new(directory.as_ref());
        let geometry = GeometryStore::load(&layout.patch_meta_path())?;
        let analyses = layout.list_analyses()?;
        let (features, meta) = load_source(&layout, MODULE_LAYOUT)?;

        let mut source_names = Vec::with_capacity(analyses.len() + 1);
        source_names.push(MODULE_LAYOUT.to_string());
        source_names.extend(analyses);

        self.dataset = Some(OpenDataset {
            layout,
            geometry: Arc::new(geometry),
            source_names,
            active: None,
        });
        self.selected_track = None;
        self.patch_index = 0;
        log::info!("opened dataset {}", directory.as_ref().display());
        self.events.emit(&DatasetEvent::Opened);
        self.events.emit(&DatasetEvent::SourceNamesUpdated);
        self.activate(MODULE_LAYOUT, features, meta);
        Ok(())
    }

    /// Closes the dataset. Closing a closed model does nothing.
    pub fn close(&mut self) {
        let Some(dataset) = self.dataset.take() else {
            return;
        };
        self.selected_column = None;
        self.selected_track = None;
        self.patch_index = 0;
        log::info!("closed dataset {}", dataset.layout.root().display());
        self.events.emit(&DatasetEvent::Closed);
    }

    /// Returns true while a dataset is open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.dataset.is_some()
    }

    /// Root directory of the open dataset.
    #[must_use]
    pub fn directory(&self) -> Option<&Path> {
        self.dataset.as_ref().map(|d| d.layout.root())
    }

    /// Layout of the open dataset.
    #[must_use]
    pub fn layout(&self) -> Option<&DatasetLayout> {
        self.dataset.as_ref().map(|d| &d.layout)
    }

    /// Patch quadrilaterals of the open dataset, shareable across threads.
    #[must_use]
    pub fn geometry(&self) -> Option<Arc<GeometryStore>> {
        self.dataset.as_ref().map(|d| Arc::clone(&d.geometry))
    }

    /// Source names, `"Module Layout"` first. Empty while closed.
    #[must_use]
    pub fn source_names(&self) -> &[String] {
        self.dataset
            .as_ref()
            .map(|d| d.source_names.as_slice())
            .unwrap_or_default()
    }

    /// Snapshot of the active source.
    #[must_use]
    pub fn active(&self) -> Option<Arc<ActiveSource>> {
        self.dataset.as_ref().and_then(|d| d.active.clone())
    }

    /// Name of the active source.
    #[must_use]
    pub fn selected_source(&self) -> Option<&str> {
        self.active_ref().map(|a| a.name.as_str())
    }

    /// Features of the active source.
    #[must_use]
    pub fn features(&self) -> Option<&FeatureCollection> {
        self.active_ref().map(|a| &a.features)
    }

    /// Metadata of the active source.
    #[must_use]
    pub fn meta(&self) -> Option<&AnalysisMeta> {
        self.active_ref().and_then(|a| a.meta.as_ref())
    }

    /// Colorbar label of the active source; `None` without metadata.
    #[must_use]
    pub fn value_label(&self) -> Option<&'static str> {
        self.meta().map(AnalysisMeta::value_label)
    }

    fn active_ref(&self) -> Option<&ActiveSource> {
        self.dataset.as_ref().and_then(|d| d.active.as_deref())
    }

    /// Re-reads the analyses directory.
    ///
    /// If the active source disappeared it is dropped and
    /// [`DatasetEvent::SourceInvalidated`] is emitted. Does nothing while
    /// closed.
    ///
    /// # Errors
    /// Returns an error if the analyses directory cannot be listed.
    pub fn refresh_source_names(&mut self) -> Result<()> {
        let Some(dataset) = self.dataset.as_mut() else {
            return Ok(());
        };
        let analyses = dataset.layout.list_analyses()?;
        let mut names = Vec::with_capacity(analyses.len() + 1);
        names.push(MODULE_LAYOUT.to_string());
        names.extend(analyses);
        dataset.source_names = names;

        let stale = dataset
            .active
            .as_ref()
            .filter(|active| !dataset.source_names.contains(&active.name))
            .map(|active| active.name.clone());
        if let Some(name) = stale {
            self.invalidate_active(name);
        }
        self.events.emit(&DatasetEvent::SourceNamesUpdated);
        Ok(())
    }

    /// Makes `name` the active source.
    ///
    /// Features and metadata are replaced together and observers get a
    /// single [`DatasetEvent::SourceChanged`]. The column selection resets
    /// to the first column.
    ///
    /// # Errors
    /// Returns `NotFound` if no dataset is open or the source has no
    /// complete result set, `MalformedData` if its files cannot be decoded.
    /// The previous source stays active on error.
    pub fn select_source(&mut self, name: &str) -> Result<()> {
        let layout = self
            .layout()
            .ok_or_else(|| Error::NotFound("no dataset is open".to_string()))?;
        let (features, meta) = load_source(layout, name)?;
        self.activate(name, features, meta);
        Ok(())
    }

    fn activate(&mut self, name: &str, features: FeatureCollection, meta: Option<AnalysisMeta>) {
        let Some(dataset) = self.dataset.as_mut() else {
            return;
        };
        let has_columns = !column_names(&features).is_empty();
        dataset.active = Some(Arc::new(ActiveSource {
            name: name.to_string(),
            features,
            meta,
        }));
        self.selected_column = has_columns.then_some(0);
        log::info!("selected source {name:?}");
        self.events.emit(&DatasetEvent::SourceChanged(name.to_string()));
    }

    fn invalidate_active(&mut self, name: String) {
        if let Some(dataset) = self.dataset.as_mut() {
            dataset.active = None;
        }
        self.selected_column = None;
        log::info!("source {name:?} is no longer available");
        self.events.emit(&DatasetEvent::SourceInvalidated(name));
    }

    /// Deletes an analysis result set from disk and re-reads the sources.
    ///
    /// `None`, `"Module Layout"` and a closed model are no-ops. Deleting the
    /// active source invalidates it before anything is removed.
    ///
    /// # Errors
    /// Returns an error if the directory exists but cannot be removed, or
    /// the sources cannot be re-read.
    pub fn delete_source(&mut self, name: Option<&str>) -> Result<()> {
        let Some(name) = name.filter(|n| *n != MODULE_LAYOUT) else {
            return Ok(());
        };
        let Some(layout) = self.layout().cloned() else {
            return Ok(());
        };
        if self.selected_source() == Some(name) {
            self.invalidate_active(name.to_string());
        }
        remove_analysis(&layout, name)?;
        self.refresh_source_names()
    }

    /// Sorted property names of the active source, without `track_id`.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.features().map(column_names).unwrap_or_default()
    }

    /// Values of property `name` keyed by track id.
    #[must_use]
    pub fn column(&self, name: &str) -> Column {
        self.features()
            .map(|features| project_column(features, name))
            .unwrap_or_default()
    }

    /// Index of the selected column.
    #[must_use]
    pub fn selected_column_index(&self) -> Option<usize> {
        self.selected_column
    }

    /// Selects a column by index. Out-of-range indices are kept and resolve
    /// to an empty column.
    pub fn set_selected_column(&mut self, index: Option<usize>) {
        if self.selected_column != index {
            self.selected_column = index;
            self.events.emit(&DatasetEvent::SelectedColumnChanged(index));
        }
    }

    /// Values of the selected column; empty if unset or out of range.
    #[must_use]
    pub fn selected_column(&self) -> Column {
        self.selected_column
            .and_then(|index| self.column_names().into_iter().nth(index))
            .map(|name| self.column(&name))
            .unwrap_or_default()
    }

    /// Selects a module for the frame view and rewinds to its first patch.
    pub fn select_track(&mut self, track_id: &str) {
        self.selected_track = Some(track_id.to_string());
        self.patch_index = 0;
        self.events.emit(&DatasetEvent::TrackChanged(track_id.to_string()));
        self.events.emit(&DatasetEvent::PatchIndexChanged(0));
    }

    /// Module shown in the frame view.
    #[must_use]
    pub fn selected_track(&self) -> Option<&str> {
        self.selected_track.as_deref()
    }

    /// Index of the inspected patch of the selected module.
    #[must_use]
    pub fn patch_index(&self) -> usize {
        self.patch_index
    }

    /// Number of stored patches of the selected module.
    #[must_use]
    pub fn patch_count(&self) -> usize {
        match (self.layout(), self.selected_track()) {
            (Some(layout), Some(track)) => list_patch_files(layout, track).map_or(0, |f| f.len()),
            _ => 0,
        }
    }

    /// Moves to another patch of the selected module, clamped to the
    /// available patches. Returns the index actually set.
    pub fn set_patch_index(&mut self, index: usize) -> usize {
        let clamped = index.min(self.patch_count().saturating_sub(1));
        if clamped != self.patch_index {
            self.patch_index = clamped;
            self.events.emit(&DatasetEvent::PatchIndexChanged(clamped));
        }
        clamped
    }
}
