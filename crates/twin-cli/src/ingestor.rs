//! Entry point for starting ingestions
//!
//! [`Ingestor`] owns the backend, scheduler, and policies, and hands out a
//! fresh [`IngestionTracker`] per file.

use crate::api::backend::IngestBackend;
use crate::observer::ProgressObserver;
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::task::IngestionTask;
use crate::tracker::{IngestionTracker, PollPolicy};
use crate::validation::{CandidateFile, ValidatedFile, ValidationError, ValidationRules};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Validates files and runs their ingestion to completion
pub struct Ingestor<B, S = TokioScheduler> {
    backend: B,
    scheduler: S,
    rules: ValidationRules,
    policy: PollPolicy,
}

impl<B: IngestBackend> Ingestor<B, TokioScheduler> {
    /// Ingestor with default rules, default poll policy, and the tokio clock
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            scheduler: TokioScheduler,
            rules: ValidationRules::default(),
            policy: PollPolicy::default(),
        }
    }
}

impl<B: IngestBackend, S: Scheduler> Ingestor<B, S> {
    pub fn with_scheduler<S2: Scheduler>(self, scheduler: S2) -> Ingestor<B, S2> {
        Ingestor {
            backend: self.backend,
            scheduler,
            rules: self.rules,
            policy: self.policy,
        }
    }

    pub fn with_rules(mut self, rules: ValidationRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Local checks only; never touches the backend
    pub fn validate(&self, candidate: CandidateFile) -> Result<ValidatedFile, ValidationError> {
        self.rules.validate(candidate)
    }

    /// A single-use tracker bound to this ingestor's backend and policy
    pub fn tracker(&self) -> IngestionTracker<'_, B, S> {
        IngestionTracker::new(&self.backend, &self.scheduler, &self.policy)
    }

    /// Validate `candidate` and, if accepted, run it to a terminal phase.
    ///
    /// Returns `Err` only for local validation failures. Upload, processing,
    /// timeout, and cancellation failures come back as `Ok(task)` with
    /// [`twin_common::Phase::Failed`].
    pub async fn start_ingestion(
        &self,
        candidate: CandidateFile,
        observer: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<IngestionTask, ValidationError> {
        let file = self.validate(candidate).inspect_err(|e| {
            warn!(error = %e, "File rejected before upload");
        })?;

        info!(file = %file.name(), size = file.size_bytes(), "Starting ingestion");
        Ok(self.tracker().run(&file, observer, cancel).await)
    }
}
