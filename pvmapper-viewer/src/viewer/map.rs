//! Bridge between the dataset model and an external map renderer.
//!
//! The renderer pulls `{"data": <feature collection>, "colors": {track_id: color}}`
//! through [`MapBridge::load_data`] whenever it receives
//! [`MapSignal::Changed`], and reports clicked modules back through
//! [`MapBridge::update_images`].

use pvmapper_core::{Error, Result, TRACK_ID_KEY};
use serde_json::{json, Value};

use super::colors::{colorize, ColorAssignment, MapSettings};
use crate::state::{DatasetEvent, DatasetModel};

/// Notifications sent to the map renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapSignal {
    /// Data or colors changed; the renderer should call `load_data` again.
    Changed,
    /// Nothing can be shown anymore; the renderer should clear the map.
    Closed,
}

/// Map signal caused by a dataset event, if any.
#[must_use]
pub fn map_signal(event: &DatasetEvent) -> Option<MapSignal> {
    match event {
        DatasetEvent::Opened
        | DatasetEvent::SourceChanged(_)
        | DatasetEvent::SelectedColumnChanged(_) => Some(MapSignal::Changed),
        DatasetEvent::Closed | DatasetEvent::SourceInvalidated(_) => Some(MapSignal::Closed),
        DatasetEvent::SourceNamesUpdated
        | DatasetEvent::TrackChanged(_)
        | DatasetEvent::PatchIndexChanged(_) => None,
    }
}

/// Request/response surface used by the map renderer.
#[derive(Debug, Clone, Default)]
pub struct MapBridge {
    settings: MapSettings,
}

impl MapBridge {
    /// Creates a bridge with the given coloring.
    #[must_use]
    pub fn new(settings: MapSettings) -> Self {
        Self { settings }
    }

    /// Current coloring.
    #[must_use]
    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    /// Replaces the coloring. Returns [`MapSignal::Changed`] if anything changed.
    pub fn set_settings(&mut self, settings: MapSettings) -> Option<MapSignal> {
        if self.settings == settings {
            return None;
        }
        self.settings = settings;
        Some(MapSignal::Changed)
    }

    /// Colors of the active source's modules for the selected column.
    #[must_use]
    pub fn colors(&self, model: &DatasetModel) -> ColorAssignment {
        let Some(features) = model.features() else {
            return ColorAssignment::new();
        };
        colorize(&model.selected_column(), features.track_ids(), &self.settings)
    }

    /// Features and colors of the active source.
    ///
    /// `data` is an empty list when no source is active.
    #[must_use]
    pub fn load_data(&self, model: &DatasetModel) -> Value {
        let data = model
            .features()
            .and_then(|features| serde_json::to_value(features).ok())
            .unwrap_or_else(|| json!([]));
        json!({
            "data": data,
            "colors": self.colors(model),
        })
    }

    /// Handles a module click from the renderer.
    ///
    /// `request` is either a JSON string holding the track id or an object
    /// with a `track_id` member.
    ///
    /// # Errors
    /// Returns `MalformedData` if the request carries no track id.
    pub fn update_images(&self, model: &mut DatasetModel, request: &str) -> Result<()> {
        let value: Value = serde_json::from_str(request)
            .map_err(|e| Error::MalformedData(format!("map request: {e}")))?;
        let track_id = match &value {
            Value::String(id) => Some(id.as_str()),
            Value::Object(fields) => fields.get(TRACK_ID_KEY).and_then(Value::as_str),
            _ => None,
        }
        .ok_or_else(|| Error::MalformedData(format!("map request without track id: {request}")))?;
        model.select_track(track_id);
        Ok(())
    }
}
