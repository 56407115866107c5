//! Background analysis jobs.

mod runner;
mod worker;

pub use runner::{AnalysisJobRunner, JobState};
pub use worker::{run_module_temperatures_worker, AnalysisJob, CancelToken};

/// Capacity of the worker-to-host message channel.
pub(crate) const MESSAGE_CAPACITY: usize = 64;
