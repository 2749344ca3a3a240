//! Ingestion task tracker
//!
//! Drives one validated file through submit → poll → resolve and turns the
//! backend's asynchronous job into a single terminal [`IngestionTask`].
//!
//! The first status poll is issued as soon as the backend acknowledges the
//! upload; consecutive polls are separated by [`PollPolicy::interval`].
//! Every poll counts toward [`PollPolicy::max_attempts`], including the one
//! that returns a terminal status, so the loop always ends.
//!
//! Cancellation is observed before submitting, while a request is in flight,
//! while waiting between polls, and before a poll result is committed.

use crate::api::backend::{IngestBackend, StatusReport};
use crate::observer::ProgressObserver;
use crate::scheduler::Scheduler;
use crate::task::{IngestionTask, TransitionError};
use crate::validation::ValidatedFile;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use twin_common::types::advance_progress;
use twin_common::FailureKind;

/// Delay between status polls
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Polls issued before giving up (about five minutes at the default interval)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60;

/// Progress added per in-progress poll
pub const DEFAULT_PROGRESS_STEP: u8 = 10;

/// Progress is held at or below this until the backend reports completion
pub const DEFAULT_PROGRESS_CEILING: u8 = 90;

/// Detail used when the backend reports failure without saying why
pub const GENERIC_FAILURE_DETAIL: &str = "Processing failed";

/// Detail used when the task is cancelled by the caller
pub const CANCELLED_DETAIL: &str = "Ingestion was cancelled";

/// Timing and progress policy for the poll loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub progress_step: u8,
    pub progress_ceiling: u8,
    /// Consecutive transient poll failures tolerated before failing the task.
    /// Zero means the first transport error is terminal.
    pub transient_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            progress_step: DEFAULT_PROGRESS_STEP,
            progress_ceiling: DEFAULT_PROGRESS_CEILING,
            transient_retries: 0,
        }
    }
}

impl PollPolicy {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_progress_step(mut self, step: u8) -> Self {
        self.progress_step = step;
        self
    }

    /// Clamped to 100
    pub fn with_progress_ceiling(mut self, ceiling: u8) -> Self {
        self.progress_ceiling = ceiling.min(100);
        self
    }

    pub fn with_transient_retries(mut self, retries: u32) -> Self {
        self.transient_retries = retries;
        self
    }

    /// Upper bound on time spent waiting between polls
    pub fn max_wait(&self) -> Duration {
        self.interval * self.max_attempts.saturating_sub(1)
    }

    fn timeout_detail(&self) -> String {
        format!(
            "Processing timed out after {} status checks ({}s)",
            self.max_attempts,
            self.max_wait().as_secs()
        )
    }
}

/// Single-use state machine for one file.
///
/// [`IngestionTracker::run`] consumes the tracker, so a tracker can never be
/// reused once its task has reached a terminal phase.
pub struct IngestionTracker<'a, B: ?Sized, S: ?Sized> {
    backend: &'a B,
    scheduler: &'a S,
    policy: &'a PollPolicy,
}

impl<'a, B, S> IngestionTracker<'a, B, S>
where
    B: IngestBackend + ?Sized,
    S: Scheduler + ?Sized,
{
    pub fn new(backend: &'a B, scheduler: &'a S, policy: &'a PollPolicy) -> Self {
        Self {
            backend,
            scheduler,
            policy,
        }
    }

    /// Run the task to a terminal phase and return it
    #[instrument(skip_all, fields(file = %file.name()))]
    pub async fn run(
        self,
        file: &ValidatedFile,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> IngestionTask {
        let mut task = IngestionTask::new(file.name());

        if let Err(e) = self.drive(&mut task, file, observer, cancel).await {
            error!(error = %e, "Ingestion state machine rejected a transition");
            if !task.is_terminal() {
                if let Err(e) =
                    finish_failed(&mut task, observer, FailureKind::Transport, e.to_string())
                {
                    error!(error = %e, "Could not mark task as failed");
                }
            }
        }

        task
    }

    async fn drive(
        &self,
        task: &mut IngestionTask,
        file: &ValidatedFile,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<(), TransitionError> {
        if cancel.is_cancelled() {
            return finish_cancelled(task, observer);
        }

        task.begin_upload()?;
        observer.on_progress(&task.event());

        let submitted = tokio::select! {
            biased;
            _ = cancel.cancelled() => return finish_cancelled(task, observer),
            result = self.backend.submit(file) => result,
        };

        let submission = match submitted {
            Ok(submission) => submission,
            Err(e) => {
                warn!(error = %e, "Upload failed");
                return finish_failed(task, observer, FailureKind::Transport, e.to_string());
            },
        };

        let task_id = submission.task_id;
        info!(task_id = %task_id, "Upload accepted, waiting for processing");
        task.accept(task_id.clone())?;
        observer.on_progress(&task.event());

        let mut transient_budget = self.policy.transient_retries;

        loop {
            if task.attempt_count() >= self.policy.max_attempts {
                return self.finish_timed_out(task, observer);
            }

            if cancel.is_cancelled() {
                return finish_cancelled(task, observer);
            }

            let polled = tokio::select! {
                biased;
                _ = cancel.cancelled() => return finish_cancelled(task, observer),
                result = self.backend.poll_status(&task_id) => result,
            };

            if cancel.is_cancelled() {
                return finish_cancelled(task, observer);
            }

            task.record_poll()?;
            let attempt = task.attempt_count();

            match polled {
                Ok(StatusReport::Processing { progress, message }) => {
                    transient_budget = self.policy.transient_retries;
                    let next = advance_progress(
                        task.progress_percent(),
                        self.policy.progress_step,
                        self.policy.progress_ceiling,
                        progress,
                    );
                    task.record_progress(next)?;
                    debug!(
                        task_id = %task_id,
                        attempt,
                        progress = next,
                        message = message.as_deref().unwrap_or(""),
                        "Task still processing"
                    );
                    observer.on_progress(&task.event());
                },
                Ok(StatusReport::Completed { resource_id }) => {
                    info!(
                        task_id = %task_id,
                        attempt,
                        resource_id = resource_id.as_deref().unwrap_or(""),
                        "Task completed"
                    );
                    task.succeed(resource_id)?;
                    observer.on_progress(&task.event());
                    return Ok(());
                },
                Ok(StatusReport::Failed { detail }) => {
                    let detail = detail.unwrap_or_else(|| GENERIC_FAILURE_DETAIL.to_string());
                    warn!(
                        task_id = %task_id,
                        attempt,
                        detail = %detail,
                        "Backend reported failure"
                    );
                    return finish_failed(task, observer, FailureKind::BackendReported, detail);
                },
                Err(e) if e.is_transient() && transient_budget > 0 => {
                    transient_budget -= 1;
                    warn!(
                        task_id = %task_id,
                        attempt,
                        error = %e,
                        retries_left = transient_budget,
                        "Transient status poll failure, retrying"
                    );
                    observer.on_progress(&task.event());
                },
                Err(e) => {
                    warn!(task_id = %task_id, attempt, error = %e, "Status poll failed");
                    return finish_failed(task, observer, FailureKind::Transport, e.to_string());
                },
            }

            if task.attempt_count() >= self.policy.max_attempts {
                return self.finish_timed_out(task, observer);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return finish_cancelled(task, observer),
                _ = self.scheduler.sleep(self.policy.interval) => {},
            }
        }
    }

    fn finish_timed_out(
        &self,
        task: &mut IngestionTask,
        observer: &dyn ProgressObserver,
    ) -> Result<(), TransitionError> {
        warn!(attempts = task.attempt_count(), "Gave up waiting for processing");
        finish_failed(task, observer, FailureKind::Timeout, self.policy.timeout_detail())
    }
}

fn finish_cancelled(
    task: &mut IngestionTask,
    observer: &dyn ProgressObserver,
) -> Result<(), TransitionError> {
    info!("Ingestion cancelled");
    finish_failed(task, observer, FailureKind::Cancelled, CANCELLED_DETAIL)
}

fn finish_failed(
    task: &mut IngestionTask,
    observer: &dyn ProgressObserver,
    kind: FailureKind,
    detail: impl Into<String>,
) -> Result<(), TransitionError> {
    task.fail(kind, detail)?;
    observer.on_progress(&task.event());
    Ok(())
}
