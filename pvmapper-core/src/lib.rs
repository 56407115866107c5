//! pvmapper-core: Core types for PV module thermal dataset inspection.
//!
//! This crate provides the shared vocabulary of the workspace: the
//! GeoJSON feature model with tagged property values, detection
//! quadrilaterals, radiometric frames and display palettes.
//!

pub mod error;
pub mod feature;
pub mod frame;
pub mod geometry;
pub mod palette;

pub use error::{Error, Result};
pub use feature::{AnalysisMeta, Feature, FeatureCollection, PropertyValue, TRACK_ID_KEY};
pub use frame::{raw_to_celsius, RadiometricFrame};
pub use geometry::{PatchKey, Quadrilateral};
pub use palette::Palette;

/// Name of the synthetic source backed by the base module layout.
pub const MODULE_LAYOUT: &str = "Module Layout";
