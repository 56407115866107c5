//! Progress reporting and cooperative cancellation for long analyses.

/// Receiver of progress reports from a running analysis.
///
/// Analyses call [`is_cancelled`](ProgressSink::is_cancelled) at their
/// checkpoints and stop as soon as it returns true.
pub trait ProgressSink {
    /// Reports the completed fraction in `[0, 1]` with a status line.
    fn report(&mut self, fraction: f32, status: &str);

    /// Whether the analysis should stop at the next checkpoint.
    fn is_cancelled(&self) -> bool;
}

/// Result of an analysis that may be cancelled.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The analysis ran to the end.
    Finished(T),
    /// The analysis observed a cancellation request.
    Cancelled {
        /// Work items finished before stopping.
        completed: usize,
        /// Total work items.
        total: usize,
    },
}

impl<T> Outcome<T> {
    /// Returns true for [`Outcome::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled { .. })
    }
}
