//! Value-to-color mapping for the module map.

use std::collections::BTreeMap;

use pvmapper_core::frame::unit_interval;
use pvmapper_core::{Palette, PropertyValue};

use super::Column;

/// Marker color of every module when no column can be shown.
pub const DEFAULT_MARKER_COLOR: &str = "#ff7800";

/// Color of modules whose value is NaN (explicit null).
pub const NO_DATA_COLOR: &str = "#7f7f7f";

/// Display color per track id.
pub type ColorAssignment = BTreeMap<String, String>;

/// Palette and value range of the map coloring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapSettings {
    /// Palette applied to normalized values.
    pub palette: Palette,
    /// Value mapped to the low end of the palette.
    pub vmin: f64,
    /// Value mapped to the high end of the palette.
    pub vmax: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            palette: Palette::Plasma,
            vmin: -5.0,
            vmax: 5.0,
        }
    }
}

/// Colors every module of a column.
///
/// Numbers are normalized against `[vmin, vmax]` (clamping outliers) and
/// looked up in the palette; NaN gets [`NO_DATA_COLOR`]. Non-numeric values
/// are skipped. An empty column instead gives every id in `track_ids` the
/// [`DEFAULT_MARKER_COLOR`].
#[must_use]
pub fn colorize<'a>(
    values: &Column,
    track_ids: impl IntoIterator<Item = &'a str>,
    settings: &MapSettings,
) -> ColorAssignment {
    if values.is_empty() {
        return track_ids
            .into_iter()
            .map(|id| (id.to_string(), DEFAULT_MARKER_COLOR.to_string()))
            .collect();
    }

    let mut colors = ColorAssignment::new();
    for (track_id, value) in values {
        let color = match value {
            PropertyValue::Number(v) if v.is_nan() => NO_DATA_COLOR.to_string(),
            PropertyValue::Number(v) => settings
                .palette
                .hex(unit_interval(*v, settings.vmin, settings.vmax)),
            other => {
                log::warn!("module {track_id}: cannot color non-numeric value {other:?}");
                continue;
            }
        };
        colors.insert(track_id.clone(), color);
    }
    colors
}
