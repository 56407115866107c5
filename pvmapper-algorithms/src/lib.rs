//! pvmapper-algorithms: Analyses over PV module thermal datasets.
//!
//! This crate provides the module temperature analysis:
//! - **Patch statistics** - mean/max temperature inside a border margin
//! - **Module aggregation** - median over all detection patches of a module
//! - **Neighbor correction** - deviation from the median of nearby modules
//!
#![warn(missing_docs)]

mod progress;
pub mod spatial;
mod temperatures;

pub use progress::{Outcome, ProgressSink};
pub use spatial::SpatialGrid;
pub use temperatures::{
    compute_module_temperatures, module_temperature, neighbor_corrected, patch_statistics,
    ModuleTemperature, ModuleTemperatureConfig, PatchStatistics, MAX_TEMP, MAX_TEMP_CORRECTED,
    MEAN_TEMP, MEAN_TEMP_CORRECTED,
};
