//! pvmapper-io: Dataset directory I/O for pvmapper.
//!
//! This crate knows the on-disk layout of a dataset: where the module
//! layout, analysis result sets, patch metadata, detection patches and
//! radiometric source frames live, and how to read or write each of them.
//!

mod error;
pub mod frames;
pub mod layout;
pub mod patch_meta;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use frames::{list_patch_files, read_radiometric, write_radiometric, PatchFile};
pub use layout::{is_valid_dataset, validate_analysis_name, DatasetLayout};
pub use patch_meta::GeometryStore;
pub use reader::{load_source, read_feature_collection, read_meta};
pub use writer::{remove_analysis, ResultWriter};
