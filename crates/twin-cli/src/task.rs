//! The ingestion task record
//!
//! An [`IngestionTask`] is only mutated through its transition methods, each
//! of which checks [`Phase::can_advance_to`] first. That keeps the phase
//! monotonic and guarantees the outcome fields are set exactly once, on the
//! matching terminal transition.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use twin_common::types::COMPLETE_PERCENT;
use twin_common::{FailureKind, Phase, ProgressEvent, TaskId};

/// A transition the lifecycle does not allow
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("illegal task transition from {from} to {to}")]
pub struct TransitionError {
    pub from: Phase,
    pub to: Phase,
}

/// Why and how a task failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFailure {
    pub kind: FailureKind,
    pub detail: String,
}

/// One file's end-to-end ingestion attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestionTask {
    file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    task_id: Option<TaskId>,
    phase: Phase,
    progress_percent: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    result_resource_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<TaskFailure>,
    attempt_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    finished_at: Option<DateTime<Utc>>,
}

impl IngestionTask {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            task_id: None,
            phase: Phase::Idle,
            progress_percent: 0,
            result_resource_id: None,
            failure: None,
            attempt_count: 0,
            started_at: None,
            finished_at: None,
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress_percent
    }

    pub fn result_resource_id(&self) -> Option<&str> {
        self.result_resource_id.as_deref()
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        self.failure.as_ref()
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.detail.as_str())
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.kind)
    }

    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Snapshot for progress observers
    pub fn event(&self) -> ProgressEvent {
        ProgressEvent {
            phase: self.phase,
            progress_percent: self.progress_percent,
            attempt_count: self.attempt_count,
            task_id: self.task_id.clone(),
        }
    }

    pub(crate) fn begin_upload(&mut self) -> Result<(), TransitionError> {
        self.advance(Phase::Uploading)?;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    pub(crate) fn accept(&mut self, task_id: TaskId) -> Result<(), TransitionError> {
        self.advance(Phase::Processing)?;
        self.task_id = Some(task_id);
        Ok(())
    }

    /// Count one issued status poll
    pub(crate) fn record_poll(&mut self) -> Result<(), TransitionError> {
        self.advance(Phase::Processing)?;
        self.attempt_count += 1;
        Ok(())
    }

    /// Move progress forward; lower values are ignored
    pub(crate) fn record_progress(&mut self, percent: u8) -> Result<(), TransitionError> {
        self.advance(Phase::Processing)?;
        self.progress_percent = self.progress_percent.max(percent.min(COMPLETE_PERCENT));
        Ok(())
    }

    pub(crate) fn succeed(&mut self, resource_id: Option<String>) -> Result<(), TransitionError> {
        self.advance(Phase::Succeeded)?;
        self.progress_percent = COMPLETE_PERCENT;
        self.result_resource_id = resource_id;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    pub(crate) fn fail(
        &mut self,
        kind: FailureKind,
        detail: impl Into<String>,
    ) -> Result<(), TransitionError> {
        self.advance(Phase::Failed)?;
        self.failure = Some(TaskFailure {
            kind,
            detail: detail.into(),
        });
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn advance(&mut self, to: Phase) -> Result<(), TransitionError> {
        if !self.phase.can_advance_to(to) {
            return Err(TransitionError {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(())
    }
}
