//! Dataset state and observer events.

mod dataset;
mod events;

pub use dataset::{ActiveSource, DatasetModel};
pub use events::{DatasetEvent, EventBus};
