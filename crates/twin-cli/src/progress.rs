//! Terminal progress display for ingestion tasks

use crate::observer::ProgressObserver;
use indicatif::{ProgressBar, ProgressStyle};
use twin_common::{Phase, ProgressEvent};

const BAR_TEMPLATE: &str =
    "{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos:>3}%";

/// Create a percent-based progress bar for one ingestion task
pub fn create_ingestion_progress(file_name: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    let style = ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(format!("{} {}", phase_label(Phase::Idle), file_name));
    pb
}

/// Human-readable label for a phase
pub fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "Waiting",
        Phase::Uploading => "Uploading",
        Phase::Processing => "Analyzing chat history",
        Phase::Succeeded => "Done",
        Phase::Failed => "Failed",
    }
}

/// Feeds [`ProgressEvent`]s into an indicatif bar
pub struct BarObserver {
    bar: ProgressBar,
    file_name: String,
}

impl BarObserver {
    pub fn new(bar: ProgressBar, file_name: impl Into<String>) -> Self {
        Self {
            bar,
            file_name: file_name.into(),
        }
    }
}

impl ProgressObserver for BarObserver {
    fn on_progress(&self, event: &ProgressEvent) {
        self.bar.set_position(u64::from(event.progress_percent));
        let message = match (&event.task_id, event.phase) {
            (Some(task_id), Phase::Processing) => format!(
                "{} {} (task {}, check {})",
                phase_label(event.phase),
                self.file_name,
                task_id,
                event.attempt_count
            ),
            _ => format!("{} {}", phase_label(event.phase), self.file_name),
        };
        self.bar.set_message(message);
        if event.phase.is_terminal() {
            self.bar.finish_and_clear();
        }
    }
}

/// Format bytes into human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
