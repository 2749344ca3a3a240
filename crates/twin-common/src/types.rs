//! Shared domain types for the file-ingestion lifecycle
//!
//! A submitted file moves through [`Phase`]s strictly forward:
//!
//! ```text
//! Idle -> Uploading -> Processing -> Succeeded
//!   \          \            \
//!    `----------`------------`----> Failed
//! ```
//!
//! `Processing -> Processing` is the only self-loop (one per in-progress poll).

use crate::error::{Result, TwinError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Progress reported once a task has succeeded
pub const COMPLETE_PERCENT: u8 = 100;

/// Opaque task identifier assigned by the backend on submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId(String);

impl TaskId {
    /// Wrap a backend-assigned id, rejecting blank strings
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TwinError::InvalidTaskId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TaskId {
    type Err = TwinError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for TaskId {
    type Error = TwinError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.0
    }
}

/// Lifecycle phase of an ingestion task
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Accepted locally, nothing sent yet
    #[default]
    Idle,
    /// File body is being transmitted
    Uploading,
    /// Backend acknowledged the file and is working on it
    Processing,
    /// Backend finished and produced a resource
    Succeeded,
    /// Terminal failure of any kind
    Failed,
}

impl Phase {
    /// Whether no further transitions can happen
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Succeeded | Phase::Failed)
    }

    /// Whether `self -> next` is a legal forward move
    pub fn can_advance_to(self, next: Phase) -> bool {
        match (self, next) {
            (Phase::Idle, Phase::Uploading)
            | (Phase::Uploading, Phase::Processing)
            | (Phase::Processing, Phase::Processing)
            | (Phase::Processing, Phase::Succeeded) => true,
            (from, Phase::Failed) => !from.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Uploading => "uploading",
            Phase::Processing => "processing",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a task ended in [`Phase::Failed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Network or protocol failure while submitting or polling
    Transport,
    /// The backend explicitly reported the job as failed
    BackendReported,
    /// The poll budget ran out before a terminal status arrived
    Timeout,
    /// The caller cancelled the task
    Cancelled,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Transport => "transport",
            FailureKind::BackendReported => "backend_reported",
            FailureKind::Timeout => "timeout",
            FailureKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot delivered to progress observers after every state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: Phase,
    pub progress_percent: u8,
    pub attempt_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
}

/// Next progress value after an in-progress poll.
///
/// Moves `current` forward by `step`, or to the backend's `hint` if that is
/// further along, but never past `ceiling` and never backwards.
pub fn advance_progress(current: u8, step: u8, ceiling: u8, hint: Option<u8>) -> u8 {
    let stepped = current.saturating_add(step);
    let target = hint.map_or(stepped, |hint| stepped.max(hint));
    target.min(ceiling).max(current)
}
