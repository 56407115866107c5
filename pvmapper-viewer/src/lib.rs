//! pvmapper-viewer: Interactive core of the PV module inspection tool.
//!
//! This crate holds everything between the on-disk dataset and a
//! presentation layer:
//! - **Dataset model** - open/close lifecycle, sources, selection and observer events
//! - **Map coloring** - column projection, value-to-color mapping, map bridge payloads
//! - **Frame rendering** - radiometric source frames with the module overlay burnt in
//! - **Analysis jobs** - background module temperature runs with progress and cancellation
//!

mod app;
mod message;
pub mod pipeline;
pub mod state;
mod util;
pub mod viewer;

pub use app::Inspector;
pub use message::{JobMessage, ProgressReport};
pub use pipeline::{AnalysisJob, AnalysisJobRunner, CancelToken, JobState};
pub use state::{ActiveSource, DatasetEvent, DatasetModel};
pub use util::default_analysis_name;
pub use viewer::{
    colorize, render_frame, Column, ColorAssignment, FrameSettings, FrameView, MapBridge,
    MapSettings, MapSignal, RenderedFrame,
};
