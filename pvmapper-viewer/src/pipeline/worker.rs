//! Module temperature worker for background processing.
//!
//! This module runs the module temperature analysis in a background
//! thread, writing the result set into a staging directory that only
//! becomes a source once everything is on disk.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::sync::Arc;

use pvmapper_algorithms::{
    compute_module_temperatures, ModuleTemperatureConfig, Outcome, ProgressSink,
};
use pvmapper_core::AnalysisMeta;
use pvmapper_io::{read_feature_collection, DatasetLayout, ResultWriter};

use crate::message::{JobMessage, ProgressReport};

/// Cooperative cancellation flag shared between host and worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Everything a job needs, captured when it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisJob {
    /// Dataset directory the results go into.
    pub dataset: PathBuf,
    /// Name of the analysis source to create.
    pub name: String,
    /// Analysis parameters.
    pub config: ModuleTemperatureConfig,
}

/// Forwards analysis progress into the job channel.
struct ChannelSink<'a> {
    tx: &'a SyncSender<JobMessage>,
    cancel: &'a CancelToken,
    last: f32,
}

impl ChannelSink<'_> {
    fn send(&mut self, fraction: f32, status: &str) {
        self.last = self.last.max(fraction);
        // a full channel only drops intermediate reports
        let _ = self
            .tx
            .try_send(JobMessage::Progress(ProgressReport::new(self.last, status)));
    }

    fn finish_cancelled(&self, reason: String) {
        log::info!("analysis cancelled: {reason}");
        let _ = self
            .tx
            .send(JobMessage::Progress(ProgressReport::cancelled(self.last, reason)));
    }
}

impl ProgressSink for ChannelSink<'_> {
    fn report(&mut self, fraction: f32, status: &str) {
        self.send(fraction, status);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Run the module temperature analysis in a background thread.
///
/// Progress, the final cancelled report, completion and failures are sent
/// via the channel. Cancellation is honored up to the moment the staged
/// results are moved into place.
pub fn run_module_temperatures_worker(
    job: &AnalysisJob,
    tx: &SyncSender<JobMessage>,
    cancel: &CancelToken,
) {
    let layout = DatasetLayout::new(&job.dataset);
    let mut sink = ChannelSink {
        tx,
        cancel,
        last: 0.0,
    };

    let mut writer = match ResultWriter::create(&layout, &job.name) {
        Ok(w) => w,
        Err(e) => {
            let _ = tx.send(JobMessage::Failed(e.to_string()));
            return;
        }
    };

    sink.send(0.0, "Reading module layout...");
    let modules = match read_feature_collection(&layout.module_layout_path()) {
        Ok(m) => m,
        Err(e) => {
            let _ = tx.send(JobMessage::Failed(e.to_string()));
            return;
        }
    };

    let results = match compute_module_temperatures(&layout, &modules, &job.config, &mut sink) {
        Outcome::Finished(results) => results,
        Outcome::Cancelled { completed, total } => {
            writer.abort();
            sink.finish_cancelled(format!("Cancelled after {completed} of {total} modules"));
            return;
        }
    };

    sink.send(0.95, "Writing results...");
    let meta = AnalysisMeta::module_temperatures(job.config.border_margin, job.config.neighbor_radius);
    let written = writer
        .write_results(&results)
        .and_then(|()| writer.write_meta(&meta));
    if let Err(e) = written {
        let _ = tx.send(JobMessage::Failed(e.to_string()));
        return;
    }

    if cancel.is_cancelled() {
        writer.abort();
        sink.finish_cancelled("Cancelled before the results were saved".to_string());
        return;
    }

    match writer.commit() {
        Ok(dir) => {
            log::info!("analysis {:?} written to {}", job.name, dir.display());
            sink.send(1.0, "Done");
            let _ = tx.send(JobMessage::Completed {
                dataset: job.dataset.clone(),
                name: job.name.clone(),
            });
        }
        Err(e) => {
            let _ = tx.send(JobMessage::Failed(e.to_string()));
        }
    }
}
