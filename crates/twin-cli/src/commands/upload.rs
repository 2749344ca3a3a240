//! `twin upload` command implementation
//!
//! Uploads a chat history and follows the processing job until the persona
//! exists or the task fails.

use crate::api::HttpBackend;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::ingestor::Ingestor;
use crate::progress::{self, BarObserver};
use crate::validation::CandidateFile;
use colored::Colorize;
use indicatif::ProgressBar;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use twin_common::Phase;

/// Per-invocation overrides of the configured poll policy
#[derive(Debug, Clone, Copy, Default)]
pub struct UploadOptions {
    pub poll_interval_secs: Option<u64>,
    pub max_attempts: Option<u32>,
    pub json: bool,
}

/// Upload `path` and wait for a terminal result
pub async fn run(config: &Config, path: &Path, options: UploadOptions) -> Result<()> {
    let candidate = CandidateFile::from_path(path)?;

    let mut policy = config.poll_policy();
    if let Some(secs) = options.poll_interval_secs {
        policy = policy.with_interval(Duration::from_secs(secs));
    }
    if let Some(attempts) = options.max_attempts {
        policy = policy.with_max_attempts(attempts);
    }

    let ingestor = Ingestor::new(HttpBackend::from_config(config)?)
        .with_rules(config.validation_rules())
        .with_policy(policy);

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let bar = if options.json {
        ProgressBar::hidden()
    } else {
        progress::create_ingestion_progress(candidate.name())
    };
    let observer = BarObserver::new(bar.clone(), candidate.name());

    if !options.json {
        println!(
            "{} Uploading {} ({})",
            "↑".cyan(),
            candidate.name(),
            progress::format_bytes(candidate.size_bytes())
        );
    }

    let outcome = ingestor.start_ingestion(candidate, &observer, &cancel).await;
    ctrl_c.abort();
    bar.finish_and_clear();
    let task = outcome?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&task)?);
    }

    match (task.phase(), task.failure()) {
        (Phase::Succeeded, _) => {
            if !options.json {
                match task.result_resource_id() {
                    Some(persona_id) => {
                        println!("{} Persona created: {}", "✓".green(), persona_id.bold())
                    },
                    None => println!("{} Chat history imported", "✓".green()),
                }
            }
            Ok(())
        },
        (_, Some(failure)) => Err(CliError::ingestion_failed(
            failure.kind,
            failure.detail.clone(),
        )),
        (phase, None) => {
            Err(anyhow::anyhow!("upload ended in non-terminal phase '{}'", phase).into())
        },
    }
}
