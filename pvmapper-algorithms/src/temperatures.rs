//! Module temperature analysis.
//!
//! For every module of the layout, each radiometric detection patch is
//! reduced to a mean and a maximum temperature over its interior (the patch
//! minus a border margin). A module's temperature is the median of its patch
//! statistics. Finally every module is compared against the median of its
//! neighbors within a radius, which removes irradiance and ambient drift
//! across the plant.

use std::path::Path;

use pvmapper_core::{Feature, FeatureCollection, RadiometricFrame, TRACK_ID_KEY};
use pvmapper_io::{list_patch_files, read_radiometric, DatasetLayout};
use rayon::prelude::*;

use crate::progress::{Outcome, ProgressSink};
use crate::spatial::SpatialGrid;

/// Output column: median over patches of the interior mean temperature.
pub const MEAN_TEMP: &str = "mean_temp";
/// Output column: median over patches of the interior maximum temperature.
pub const MAX_TEMP: &str = "max_temp";
/// Output column: `mean_temp` minus the neighborhood median.
pub const MEAN_TEMP_CORRECTED: &str = "mean_temp_corrected";
/// Output column: `max_temp` minus the neighborhood median.
pub const MAX_TEMP_CORRECTED: &str = "max_temp_corrected";

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Share of the progress bar spent on per-module statistics.
const STATISTICS_SHARE: f32 = 0.9;

/// Parameters of the module temperature analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModuleTemperatureConfig {
    /// Pixels discarded on every side of a patch.
    pub border_margin: u32,
    /// Neighborhood radius in meters.
    pub neighbor_radius: f64,
}

impl Default for ModuleTemperatureConfig {
    fn default() -> Self {
        Self {
            border_margin: 5,
            neighbor_radius: 7.0,
        }
    }
}

/// Temperature statistics of one patch, in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchStatistics {
    /// Mean over the patch interior.
    pub mean: f64,
    /// Maximum over the patch interior.
    pub max: f64,
}

/// Aggregated temperature of one module; `None` when no patch was usable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModuleTemperature {
    /// Median of the patch means.
    pub mean: Option<f64>,
    /// Median of the patch maxima.
    pub max: Option<f64>,
}

/// Computes statistics over a patch interior.
///
/// Returns `None` when the margin leaves no pixels.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn patch_statistics(patch: &RadiometricFrame, border_margin: usize) -> Option<PatchStatistics> {
    let interior = patch.interior_celsius(border_margin);
    if interior.is_empty() {
        return None;
    }
    let sum: f64 = interior.iter().sum();
    let max = interior.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(PatchStatistics {
        mean: sum / interior.len() as f64,
        max,
    })
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Aggregates all readable patches of a module.
///
/// A module without a patch directory, or whose patches are all unreadable,
/// yields an empty [`ModuleTemperature`].
#[must_use]
pub fn module_temperature(
    layout: &DatasetLayout,
    track_id: &str,
    border_margin: u32,
) -> ModuleTemperature {
    let files = match list_patch_files(layout, track_id) {
        Ok(files) => files,
        Err(e) => {
            log::debug!("no patches for module {track_id}: {e}");
            return ModuleTemperature::default();
        }
    };

    let margin = border_margin as usize;
    let stats: Vec<PatchStatistics> = files
        .par_iter()
        .filter_map(|path| read_patch(path).and_then(|patch| patch_statistics(&patch, margin)))
        .collect();

    let mut means: Vec<f64> = stats.iter().map(|s| s.mean).collect();
    let mut maxes: Vec<f64> = stats.iter().map(|s| s.max).collect();
    ModuleTemperature {
        mean: median(&mut means),
        max: median(&mut maxes),
    }
}

fn read_patch(path: &Path) -> Option<RadiometricFrame> {
    match read_radiometric(path) {
        Ok(patch) => Some(patch),
        Err(e) => {
            log::warn!("skipping patch {}: {e}", path.display());
            None
        }
    }
}

/// Projects `(lon, lat)` positions to meters on a plane tangent at the first position.
fn project_to_meters(positions: &[Option<(f64, f64)>]) -> Vec<Option<(f64, f64)>> {
    let Some((lon0, lat0)) = positions.iter().flatten().next().copied() else {
        return positions.to_vec();
    };
    let cos_lat0 = lat0.to_radians().cos();
    positions
        .iter()
        .map(|p| {
            p.map(|(lon, lat)| {
                (
                    (lon - lon0).to_radians() * EARTH_RADIUS_M * cos_lat0,
                    (lat - lat0).to_radians() * EARTH_RADIUS_M,
                )
            })
        })
        .collect()
}

/// Subtracts from each value the median of its neighbors' values.
///
/// Neighbors are the other modules whose position lies within `radius`
/// meters and that have a value. Modules without a value, position or
/// neighbors get `None`.
#[must_use]
pub fn neighbor_corrected(
    values: &[Option<f64>],
    positions: &[Option<(f64, f64)>],
    radius: f64,
) -> Vec<Option<f64>> {
    let planar = project_to_meters(positions);
    let mut grid = SpatialGrid::new(radius);
    for (i, (value, position)) in values.iter().zip(&planar).enumerate() {
        if let (Some(_), Some((x, y))) = (value, position) {
            grid.insert(*x, *y, i);
        }
    }

    values
        .iter()
        .zip(&planar)
        .enumerate()
        .map(|(i, (value, position))| {
            let (value, (x, y)) = ((*value)?, (*position)?);
            let mut neighbors: Vec<f64> = grid
                .query_radius(x, y, radius)
                .into_iter()
                .filter(|&&j| j != i)
                .filter_map(|&j| values[j])
                .collect();
            median(&mut neighbors).map(|m| value - m)
        })
        .collect()
}

/// Runs the module temperature analysis over every module of `modules`.
///
/// Progress is reported once per module; cancellation is checked before
/// each module and before the neighbor correction. The returned collection
/// keeps each module's geometry and carries the four temperature columns,
/// `null` where no value could be computed.
#[allow(clippy::cast_precision_loss)]
pub fn compute_module_temperatures<P: ProgressSink + ?Sized>(
    layout: &DatasetLayout,
    modules: &FeatureCollection,
    config: &ModuleTemperatureConfig,
    sink: &mut P,
) -> Outcome<FeatureCollection> {
    let tracked: Vec<(&str, &Feature)> = modules
        .features
        .iter()
        .filter_map(|f| match f.track_id() {
            Some(id) => Some((id, f)),
            None => {
                log::warn!("skipping layout feature without {TRACK_ID_KEY}");
                None
            }
        })
        .collect();
    let total = tracked.len();

    let mut temperatures = Vec::with_capacity(total);
    for (i, (track_id, _)) in tracked.iter().enumerate() {
        if sink.is_cancelled() {
            return Outcome::Cancelled {
                completed: i,
                total,
            };
        }
        temperatures.push(module_temperature(layout, track_id, config.border_margin));
        let fraction = STATISTICS_SHARE * (i + 1) as f32 / total.max(1) as f32;
        sink.report(fraction, &format!("Processed module {} of {total}", i + 1));
    }

    if sink.is_cancelled() {
        return Outcome::Cancelled {
            completed: total,
            total,
        };
    }
    sink.report(STATISTICS_SHARE, "Comparing modules with their neighbors");

    let positions: Vec<Option<(f64, f64)>> = tracked.iter().map(|(_, f)| f.centroid()).collect();
    let means: Vec<Option<f64>> = temperatures.iter().map(|t| t.mean).collect();
    let maxes: Vec<Option<f64>> = temperatures.iter().map(|t| t.max).collect();
    let means_corrected = neighbor_corrected(&means, &positions, config.neighbor_radius);
    let maxes_corrected = neighbor_corrected(&maxes, &positions, config.neighbor_radius);

    let features = tracked
        .iter()
        .enumerate()
        .map(|(i, (track_id, source))| {
            let mut feature = Feature::new(track_id, source.geometry.clone());
            feature.set_property(MEAN_TEMP, means[i]);
            feature.set_property(MAX_TEMP, maxes[i]);
            feature.set_property(MEAN_TEMP_CORRECTED, means_corrected[i]);
            feature.set_property(MAX_TEMP_CORRECTED, maxes_corrected[i]);
            feature
        })
        .collect();

    Outcome::Finished(FeatureCollection::new(features))
}
