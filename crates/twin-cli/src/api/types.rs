//! Wire payloads of the ingestion API
//!
//! These mirror the JSON the backend sends. They are converted into
//! [`Submission`] and [`StatusReport`] at the edge so nothing downstream sees
//! optional or stringly-typed fields it cannot trust.

use crate::api::backend::{StatusReport, Submission, TransportError};
use serde::{Deserialize, Serialize};
use twin_common::TaskId;

/// Response to `POST /upload/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadAccepted {
    pub task_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TryFrom<UploadAccepted> for Submission {
    type Error = TransportError;

    fn try_from(payload: UploadAccepted) -> Result<Self, Self::Error> {
        let task_id = TaskId::new(payload.task_id)
            .map_err(|e| TransportError::malformed(format!("upload response: {}", e)))?;
        Ok(Submission {
            task_id,
            message: non_blank(payload.message),
        })
    }
}

/// Response to `GET /upload/status/{task_id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusPayload {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Some deployments nest the outcome under `result`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResultPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResultPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TryFrom<TaskStatusPayload> for StatusReport {
    type Error = TransportError;

    fn try_from(payload: TaskStatusPayload) -> Result<Self, Self::Error> {
        match payload.status.to_lowercase().as_str() {
            "processing" => Ok(StatusReport::Processing {
                progress: payload.progress.map(clamp_percent),
                message: non_blank(payload.message),
            }),
            "completed" => {
                let nested = payload.result.and_then(|r| r.persona_id);
                Ok(StatusReport::Completed {
                    resource_id: non_blank(payload.persona_id).or_else(|| non_blank(nested)),
                })
            }
            "failed" => Ok(StatusReport::Failed {
                detail: non_blank(payload.error),
            }),
            other => Err(TransportError::malformed(format!(
                "unknown task status {:?}",
                other
            ))),
        }
    }
}

/// FastAPI-style error body: `{"detail": ...}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// `detail` as text; non-string details are rendered as JSON
    pub fn detail_text(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) => non_blank(Some(s.clone())),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        0
    } else {
        value.clamp(0.0, 100.0).round() as u8
    }
}
