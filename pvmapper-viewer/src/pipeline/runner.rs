//! Analysis job state machine.

use std::sync::mpsc::{sync_channel, Receiver, RecvError, TryRecvError};
use std::thread::{self, JoinHandle};

use pvmapper_algorithms::ModuleTemperatureConfig;
use pvmapper_core::{Error, Result};
use pvmapper_io::validate_analysis_name;

use super::worker::{run_module_temperatures_worker, AnalysisJob, CancelToken};
use super::MESSAGE_CAPACITY;
use crate::message::{JobMessage, ProgressReport};
use crate::state::DatasetModel;

/// Lifecycle of the analysis job.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum JobState {
    /// No job, or the last one was acknowledged.
    #[default]
    Idle,
    /// A job is computing.
    Running {
        /// Analysis name.
        name: String,
        /// Latest progress fraction.
        progress: f32,
        /// Latest status line.
        status: String,
    },
    /// Results were written and the source list refreshed.
    Completed {
        /// Analysis name.
        name: String,
    },
    /// The job stopped on request; nothing was written.
    Cancelled {
        /// Analysis name.
        name: String,
        /// Description from the final progress report.
        reason: String,
    },
    /// The job failed; nothing was written.
    Failed {
        /// Analysis name.
        name: String,
        /// Error description.
        reason: String,
    },
}

impl JobState {
    /// Whether a job is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, JobState::Running { .. })
    }

    /// Whether the job reached a terminal state that was not acknowledged yet.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            JobState::Completed { .. } | JobState::Cancelled { .. } | JobState::Failed { .. }
        )
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Idle => write!(f, "Ready"),
            JobState::Running {
                name,
                progress,
                status,
            } => write!(f, "{name}: {status} ({:.0}%)", progress * 100.0),
            JobState::Completed { name } => write!(f, "{name}: completed"),
            JobState::Cancelled { name, reason } => write!(f, "{name}: {reason}"),
            JobState::Failed { name, reason } => write!(f, "{name}: failed: {reason}"),
        }
    }
}

struct RunningJob {
    job: AnalysisJob,
    rx: Receiver<JobMessage>,
    cancel: CancelToken,
    handle: Option<JoinHandle<()>>,
}

/// Runs one analysis job at a time off the interactive thread.
///
/// The host calls [`poll`](AnalysisJobRunner::poll) regularly; it applies
/// worker messages and refreshes the dataset's sources once results are on
/// disk.
#[derive(Default)]
pub struct AnalysisJobRunner {
    state: JobState,
    running: Option<RunningJob>,
}

impl AnalysisJobRunner {
    /// Creates an idle runner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &JobState {
        &self.state
    }

    /// Whether a job is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Starts a module temperature analysis named `name` on the open dataset.
    ///
    /// The dataset directory and name are captured now; later changes to
    /// the model do not affect where the job writes.
    ///
    /// # Errors
    /// Returns `Busy` while another job runs, `NotFound` if no dataset is
    /// open, `InvalidName` for unusable names and `NameConflict` if a
    /// source with that exact name exists.
    pub fn start(
        &mut self,
        model: &DatasetModel,
        name: &str,
        config: ModuleTemperatureConfig,
    ) -> Result<()> {
        if self.is_running() {
            return Err(Error::Busy);
        }
        let dataset = model
            .directory()
            .ok_or_else(|| Error::NotFound("no dataset is open".to_string()))?
            .to_path_buf();
        validate_analysis_name(name)?;
        if model.source_names().iter().any(|n| n == name) {
            return Err(Error::NameConflict(name.to_string()));
        }

        let job = AnalysisJob {
            dataset,
            name: name.to_string(),
            config,
        };
        let (tx, rx) = sync_channel(MESSAGE_CAPACITY);
        let cancel = CancelToken::new();

        log::info!(
            "starting analysis {name:?} (border margin {}, neighbor radius {} m)",
            config.border_margin,
            config.neighbor_radius
        );
        let worker_job = job.clone();
        let worker_cancel = cancel.clone();
        let handle = thread::spawn(move || {
            run_module_temperatures_worker(&worker_job, &tx, &worker_cancel);
        });

        self.state = JobState::Running {
            name: name.to_string(),
            progress: 0.0,
            status: "Starting...".to_string(),
        };
        self.running = Some(RunningJob {
            job,
            rx,
            cancel,
            handle: Some(handle),
        });
        Ok(())
    }

    /// Requests cancellation of the running job.
    ///
    /// Returns false if no job is running. The job stops at its next
    /// checkpoint; [`poll`](AnalysisJobRunner::poll) reports the outcome.
    pub fn cancel(&self) -> bool {
        match &self.running {
            Some(running) if self.is_running() => {
                running.cancel.cancel();
                true
            }
            _ => false,
        }
    }

    /// Applies all pending worker messages without blocking.
    ///
    /// Returns true if the state changed.
    pub fn poll(&mut self, model: &mut DatasetModel) -> bool {
        let mut changed = false;
        while self.is_running() {
            let Some(running) = &self.running else {
                break;
            };
            let message = match running.rx.try_recv() {
                Ok(message) => message,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    JobMessage::Failed("analysis worker exited unexpectedly".to_string())
                }
            };
            self.apply(message, model);
            changed = true;
        }
        changed
    }

    /// Blocks until the running job finishes and returns the final state.
    pub fn wait(&mut self, model: &mut DatasetModel) -> &JobState {
        while self.is_running() {
            let Some(running) = &self.running else {
                break;
            };
            let message = running.rx.recv().unwrap_or_else(|RecvError| {
                JobMessage::Failed("analysis worker exited unexpectedly".to_string())
            });
            self.apply(message, model);
        }
        &self.state
    }

    /// Returns to `Idle` after a finished job. Returns false while running.
    pub fn acknowledge(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = JobState::Idle;
        true
    }

    fn apply(&mut self, message: JobMessage, model: &mut DatasetModel) {
        let JobState::Running {
            name,
            progress,
            status,
        } = &mut self.state
        else {
            return;
        };

        match message {
            JobMessage::Progress(ProgressReport {
                fraction,
                status: text,
                cancelled: false,
            }) => {
                *progress = progress.max(fraction);
                if let Some(text) = text {
                    *status = text;
                }
            }
            JobMessage::Progress(ProgressReport {
                status: reason,
                cancelled: true,
                ..
            }) => {
                self.state = JobState::Cancelled {
                    name: name.clone(),
                    reason: reason.unwrap_or_else(|| "Cancelled".to_string()),
                };
                self.join();
            }
            JobMessage::Completed { dataset, name: done } => {
                self.state = JobState::Completed { name: done };
                self.join();
                if model.directory() == Some(dataset.as_path()) {
                    if let Err(e) = model.refresh_source_names() {
                        log::warn!("failed to refresh sources: {e}");
                    }
                } else {
                    log::info!("analysis finished for {}, which is no longer open", dataset.display());
                }
            }
            JobMessage::Failed(reason) => {
                log::warn!("analysis {name:?} failed: {reason}");
                self.state = JobState::Failed {
                    name: name.clone(),
                    reason,
                };
                self.join();
            }
        }
    }

    fn join(&mut self) {
        let Some(mut running) = self.running.take() else {
            return;
        };
        if let Some(handle) = running.handle.take() {
            if handle.join().is_err() {
                log::warn!("analysis worker for {:?} panicked", running.job.name);
            }
        }
    }
}

impl Drop for AnalysisJobRunner {
    /// Cancels a running job and waits for its worker, so nothing is
    /// committed after the host is gone.
    fn drop(&mut self) {
        let Some(RunningJob {
            job,
            rx,
            cancel,
            handle,
        }) = self.running.take()
        else {
            return;
        };
        cancel.cancel();
        // the worker's final send must not block on a full channel
        drop(rx);
        if let Some(handle) = handle {
            if handle.join().is_err() {
                log::warn!("analysis worker for {:?} panicked", job.name);
            }
        }
        log::info!("analysis {:?} cancelled on shutdown", job.name);
    }
}
