//! Source frame rendering.
//!
//! A module's detection patch names the full radiometric frame it was
//! cropped from. The frame is converted to degrees Celsius, normalized into
//! the display range, colored and the module's quadrilateral is burnt in.

use image::{Rgb, RgbImage};
use pvmapper_core::frame::normalize_to_u8;
use pvmapper_core::{Error, Palette, PatchKey, Quadrilateral, Result};
use pvmapper_io::{list_patch_files, read_radiometric, DatasetLayout, GeometryStore, PatchFile};

use super::overlay::{draw_quadrilateral, OVERLAY_COLOR, OVERLAY_STROKE};
use crate::state::{DatasetEvent, DatasetModel};

/// Display parameters of the frame view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSettings {
    /// Temperature mapped to black / the low end of the palette, in °C.
    pub min_temp: f64,
    /// Temperature mapped to white / the high end of the palette, in °C.
    pub max_temp: f64,
    /// Palette applied to the normalized intensities.
    pub palette: Palette,
}

impl Default for FrameSettings {
    fn default() -> Self {
        Self {
            min_temp: 30.0,
            max_temp: 50.0,
            palette: Palette::Gray,
        }
    }
}

/// A rendered source frame.
#[derive(Debug, Clone)]
pub struct RenderedFrame {
    /// RGB pixels with the overlay drawn in.
    pub image: RgbImage,
    /// Quadrilateral drawn onto the image.
    pub overlay: Quadrilateral,
    /// Patch the frame was rendered for.
    pub patch: PatchKey,
    /// Index of the source frame.
    pub frame_index: u32,
    /// Number of patches of the module.
    pub patch_count: usize,
}

/// Renders the source frame of patch `patch_index` of module `track_id`.
///
/// # Errors
/// Returns `OutOfRange` if the module has no such patch, `NotFound` if the
/// patch directory, source frame or quadrilateral is missing, and
/// `MalformedData` for unparseable patch names or frames.
pub fn render_frame(
    layout: &DatasetLayout,
    geometry: &GeometryStore,
    track_id: &str,
    patch_index: usize,
    settings: &FrameSettings,
) -> Result<RenderedFrame> {
    let patches = list_patch_files(layout, track_id)?;
    let patch_count = patches.len();
    let path = patches.get(patch_index).ok_or(Error::OutOfRange {
        index: patch_index,
        len: patch_count,
    })?;
    let patch = PatchFile::parse(track_id, path)?;
    let overlay = *geometry.get(&patch.key)?;
    let frame = read_radiometric(&layout.source_frame_path(patch.frame_index))?;

    let lut = (!settings.palette.is_identity()).then(|| settings.palette.lut());
    let mut pixels = Vec::with_capacity(frame.raw().len() * 3);
    for celsius in frame.celsius() {
        let Rgb(gray) = gray_level(celsius, settings);
        let rgb = lut.as_ref().map_or(gray, |lut| lut[usize::from(gray[0])]);
        pixels.extend_from_slice(&rgb);
    }
    let width = u32::try_from(frame.width())
        .map_err(|_| Error::MalformedData("frame too wide".to_string()))?;
    let height = u32::try_from(frame.height())
        .map_err(|_| Error::MalformedData("frame too tall".to_string()))?;
    let mut image = RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| Error::MalformedData("frame buffer size mismatch".to_string()))?;

    draw_quadrilateral(&mut image, &overlay, OVERLAY_COLOR, OVERLAY_STROKE);
    log::debug!(
        "rendered frame {} for {} ({}x{})",
        patch.frame_index,
        patch.key,
        width,
        height
    );

    Ok(RenderedFrame {
        image,
        overlay,
        patch: patch.key,
        frame_index: patch.frame_index,
        patch_count,
    })
}

/// Frame view state: display settings plus the last good image.
///
/// Changes only mark the view dirty; [`refresh`](FrameView::refresh)
/// renders at most once however many changes piled up. A failed render
/// keeps the previous image.
#[derive(Debug, Default)]
pub struct FrameView {
    settings: FrameSettings,
    current: Option<RenderedFrame>,
    dirty: bool,
    render_count: usize,
}

impl FrameView {
    /// Creates an empty view.
    #[must_use]
    pub fn new(settings: FrameSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Current display settings.
    #[must_use]
    pub fn settings(&self) -> &FrameSettings {
        &self.settings
    }

    /// Sets the temperature mapped to the low end.
    pub fn set_min_temp(&mut self, min_temp: f64) {
        self.update(FrameSettings {
            min_temp,
            ..self.settings
        });
    }

    /// Sets the temperature mapped to the high end.
    pub fn set_max_temp(&mut self, max_temp: f64) {
        self.update(FrameSettings {
            max_temp,
            ..self.settings
        });
    }

    /// Sets the palette.
    pub fn set_palette(&mut self, palette: Palette) {
        self.update(FrameSettings {
            palette,
            ..self.settings
        });
    }

    /// Replaces all settings; marks the view dirty if anything changed.
    pub fn update(&mut self, settings: FrameSettings) {
        if self.settings != settings {
            self.settings = settings;
            self.dirty = true;
        }
    }

    /// Reacts to a dataset event.
    pub fn handle_event(&mut self, event: &DatasetEvent) {
        match event {
            DatasetEvent::TrackChanged(_) | DatasetEvent::PatchIndexChanged(_) => self.dirty = true,
            DatasetEvent::Opened | DatasetEvent::Closed => {
                self.current = None;
                self.dirty = false;
            }
            _ => {}
        }
    }

    /// Whether a render is pending.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Renders the selected patch if anything changed since the last refresh.
    ///
    /// Returns true if a new image was produced.
    pub fn refresh(&mut self, model: &DatasetModel) -> bool {
        if !self.dirty {
            return false;
        }
        self.dirty = false;
        let (Some(layout), Some(geometry), Some(track)) =
            (model.layout(), model.geometry(), model.selected_track())
        else {
            return false;
        };

        self.render_count += 1;
        match render_frame(layout, &geometry, track, model.patch_index(), &self.settings) {
            Ok(frame) => {
                self.current = Some(frame);
                true
            }
            Err(e) => {
                log::warn!("frame for {track} patch {} not rendered: {e}", model.patch_index());
                false
            }
        }
    }

    /// Last successfully rendered frame.
    #[must_use]
    pub fn current(&self) -> Option<&RenderedFrame> {
        self.current.as_ref()
    }

    /// Number of render attempts so far.
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.render_count
    }
}

/// Intensity of a temperature before any palette.
fn gray_level(celsius: f64, settings: &FrameSettings) -> Rgb<u8> {
    let v = normalize_to_u8(celsius, settings.min_temp, settings.max_temp);
    Rgb([v, v, v])
}
