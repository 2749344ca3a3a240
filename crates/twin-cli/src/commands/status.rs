//! `twin status` command implementation
//!
//! Issues a single status poll for a task id.

use crate::api::{HttpBackend, IngestBackend, StatusReport};
use crate::config::Config;
use crate::error::Result;
use colored::Colorize;
use serde_json::json;
use twin_common::TaskId;

/// Print the current status of `task_id`
pub async fn run(config: &Config, task_id: &str, json: bool) -> Result<()> {
    let task_id: TaskId = task_id.parse()?;
    let backend = HttpBackend::from_config(config)?;

    let report = backend.poll_status(&task_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report_json(&task_id, &report))?);
        return Ok(());
    }

    match &report {
        StatusReport::Processing { progress, message } => {
            print!("{} {} is still processing", "…".cyan(), task_id);
            if let Some(progress) = progress {
                print!(" ({}%)", progress);
            }
            println!();
            if let Some(message) = message {
                println!("  {}", message);
            }
        },
        StatusReport::Completed { resource_id } => {
            println!("{} {} completed", "✓".green(), task_id);
            if let Some(persona_id) = resource_id {
                println!("  Persona: {}", persona_id.bold());
            }
        },
        StatusReport::Failed { detail } => {
            println!("{} {} failed", "✗".red(), task_id);
            if let Some(detail) = detail {
                println!("  {}", detail);
            }
        },
    }

    Ok(())
}

fn report_json(task_id: &TaskId, report: &StatusReport) -> serde_json::Value {
    match report {
        StatusReport::Processing { progress, message } => json!({
            "task_id": task_id,
            "status": "processing",
            "progress": progress,
            "message": message,
        }),
        StatusReport::Completed { resource_id } => json!({
            "task_id": task_id,
            "status": "completed",
            "resource_id": resource_id,
        }),
        StatusReport::Failed { detail } => json!({
            "task_id": task_id,
            "status": "failed",
            "error": detail,
        }),
    }
}
