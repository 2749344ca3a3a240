//! Backend boundary used by the ingestion tracker
//!
//! The tracker only needs two calls: submit a file and ask for a task's
//! status. Anything that can answer them (the HTTP client, a test double)
//! implements [`IngestBackend`].

use crate::validation::ValidatedFile;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use twin_common::TaskId;

/// Backend acknowledgement of a submitted file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub task_id: TaskId,
    pub message: Option<String>,
}

impl Submission {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            message: None,
        }
    }
}

/// Status of a backend job, one variant per lifecycle state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReport {
    Processing {
        progress: Option<u8>,
        message: Option<String>,
    },
    Completed {
        resource_id: Option<String>,
    },
    Failed {
        detail: Option<String>,
    },
}

impl StatusReport {
    pub fn processing() -> Self {
        StatusReport::Processing {
            progress: None,
            message: None,
        }
    }

    pub fn completed(resource_id: impl Into<String>) -> Self {
        StatusReport::Completed {
            resource_id: Some(resource_id.into()),
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        StatusReport::Failed {
            detail: Some(detail.into()),
        }
    }
}

/// Failure to talk to the backend, as opposed to a job the backend failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("could not reach the ingestion server: {0}")]
    Connect(String),

    #[error("request to the ingestion server timed out: {0}")]
    Timeout(String),

    #[error("ingestion server responded with HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("malformed response from the ingestion server: {0}")]
    MalformedPayload(String),

    #[error("could not read the upload file: {0}")]
    Read(String),

    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    /// Whether retrying the same request could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Connect(_) | TransportError::Timeout(_) => true,
            TransportError::Status { status, .. } => *status >= 500 || *status == 429,
            TransportError::MalformedPayload(_)
            | TransportError::Read(_)
            | TransportError::Request(_) => false,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout(err.to_string())
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else if err.is_decode() {
            TransportError::MalformedPayload(err.to_string())
        } else if let Some(status) = err.status() {
            TransportError::Status {
                status: status.as_u16(),
                detail: err.to_string(),
            }
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Request/response operations the ingestion workflow consumes
#[async_trait]
pub trait IngestBackend: Send + Sync {
    /// Transmit the file; returns once the backend has accepted it
    async fn submit(&self, file: &ValidatedFile) -> Result<Submission, TransportError>;

    /// Ask for the current status of a submitted task
    async fn poll_status(&self, task_id: &TaskId) -> Result<StatusReport, TransportError>;
}

#[async_trait]
impl<T> IngestBackend for Arc<T>
where
    T: IngestBackend + ?Sized,
{
    async fn submit(&self, file: &ValidatedFile) -> Result<Submission, TransportError> {
        (**self).submit(file).await
    }

    async fn poll_status(&self, task_id: &TaskId) -> Result<StatusReport, TransportError> {
        (**self).poll_status(task_id).await
    }
}
