//! Messages sent from the analysis worker thread to the host.
//!
//! The worker never touches the dataset model; everything it has to say
//! travels through a bounded channel and is applied by
//! [`AnalysisJobRunner::poll`](crate::AnalysisJobRunner::poll).

use std::path::PathBuf;

/// One progress update of a running job.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    /// Completed fraction in `[0, 1]`, non-decreasing over a job.
    pub fraction: f32,
    /// Optional human-readable status line.
    pub status: Option<String>,
    /// Set on the final report of a cancelled job; `status` holds the reason.
    pub cancelled: bool,
}

impl ProgressReport {
    /// Regular progress update.
    #[must_use]
    pub fn new(fraction: f32, status: impl Into<String>) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
            status: Some(status.into()),
            cancelled: false,
        }
    }

    /// Final report of a cancelled job.
    #[must_use]
    pub fn cancelled(fraction: f32, reason: impl Into<String>) -> Self {
        Self {
            cancelled: true,
            ..Self::new(fraction, reason)
        }
    }
}

/// Messages sent from the worker to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum JobMessage {
    /// Progress update, or the final report of a cancelled job.
    Progress(ProgressReport),

    /// Results are committed to disk.
    ///
    /// Contains the dataset directory and analysis name captured at start.
    Completed {
        /// Dataset the results were written into.
        dataset: PathBuf,
        /// Name of the new analysis source.
        name: String,
    },

    /// The job failed; nothing was left behind.
    Failed(String),
}
