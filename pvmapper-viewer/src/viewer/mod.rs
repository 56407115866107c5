//! Map coloring and source frame rendering.

mod colors;
mod frame;
mod map;
mod overlay;
mod projector;

pub use colors::{colorize, ColorAssignment, MapSettings, DEFAULT_MARKER_COLOR, NO_DATA_COLOR};
pub use frame::{render_frame, FrameSettings, FrameView, RenderedFrame};
pub use map::{map_signal, MapBridge, MapSignal};
pub use overlay::{draw_quadrilateral, OVERLAY_COLOR, OVERLAY_STROKE};
pub use projector::{column_names, project_column, Column};
