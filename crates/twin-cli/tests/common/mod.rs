//! Shared test doubles for the ingestion workflow tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use twin_cli::api::{IngestBackend, StatusReport, Submission, TransportError};
use twin_cli::validation::ValidatedFile;
use twin_common::{ProgressEvent, TaskId};

/// Backend that answers from a script.
///
/// Polls pop the next scripted reply; once the script runs out every poll
/// reports `processing`.
pub struct ScriptedBackend {
    submit: Result<Submission, TransportError>,
    polls: Mutex<VecDeque<Result<StatusReport, TransportError>>>,
    submit_calls: AtomicU32,
    poll_calls: AtomicU32,
}

impl ScriptedBackend {
    pub fn accepting(task_id: &str) -> Self {
        Self {
            submit: Ok(Submission::new(TaskId::new(task_id).unwrap())),
            polls: Mutex::new(VecDeque::new()),
            submit_calls: AtomicU32::new(0),
            poll_calls: AtomicU32::new(0),
        }
    }

    pub fn rejecting(error: TransportError) -> Self {
        Self {
            submit: Err(error),
            ..Self::accepting("unused")
        }
    }

    pub fn then(self, reply: StatusReport) -> Self {
        self.polls.lock().unwrap().push_back(Ok(reply));
        self
    }

    pub fn then_processing(self, times: usize) -> Self {
        (0..times).fold(self, |backend, _| backend.then(StatusReport::processing()))
    }

    pub fn then_error(self, error: TransportError) -> Self {
        self.polls.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn submit_calls(&self) -> u32 {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn poll_calls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IngestBackend for ScriptedBackend {
    async fn submit(&self, _file: &ValidatedFile) -> Result<Submission, TransportError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submit.clone()
    }

    async fn poll_status(&self, _task_id: &TaskId) -> Result<StatusReport, TransportError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        self.polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(StatusReport::processing()))
    }
}

/// Backend whose upload never completes
#[derive(Default)]
pub struct StalledUploadBackend {
    poll_calls: AtomicU32,
}

impl StalledUploadBackend {
    pub fn poll_calls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IngestBackend for StalledUploadBackend {
    async fn submit(&self, _file: &ValidatedFile) -> Result<Submission, TransportError> {
        std::future::pending().await
    }

    async fn poll_status(&self, _task_id: &TaskId) -> Result<StatusReport, TransportError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        Ok(StatusReport::processing())
    }
}

/// Backend that cancels `cancel` while answering poll `cancel_on`, and
/// reports completion from that same poll
pub struct CancelMidPollBackend {
    cancel: CancellationToken,
    cancel_on: u32,
    poll_calls: AtomicU32,
}

impl CancelMidPollBackend {
    pub fn new(cancel: CancellationToken, cancel_on: u32) -> Self {
        Self {
            cancel,
            cancel_on,
            poll_calls: AtomicU32::new(0),
        }
    }

    pub fn poll_calls(&self) -> u32 {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IngestBackend for CancelMidPollBackend {
    async fn submit(&self, _file: &ValidatedFile) -> Result<Submission, TransportError> {
        Ok(Submission::new(TaskId::new("t1").unwrap()))
    }

    async fn poll_status(&self, _task_id: &TaskId) -> Result<StatusReport, TransportError> {
        let n = self.poll_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.cancel_on {
            self.cancel.cancel();
            return Ok(StatusReport::completed("p1"));
        }
        Ok(StatusReport::processing())
    }
}

/// Collects every event an observer receives
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl EventLog {
    pub fn observer(&self) -> impl Fn(&ProgressEvent) + Send + Sync {
        let events = Arc::clone(&self.events);
        move |event: &ProgressEvent| events.lock().unwrap().push(event.clone())
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn percents(&self) -> Vec<u8> {
        self.events().iter().map(|e| e.progress_percent).collect()
    }
}
