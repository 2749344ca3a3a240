//! `twin check` command implementation
//!
//! Runs local validation only.

use crate::config::Config;
use crate::error::Result;
use crate::progress::format_bytes;
use crate::validation::CandidateFile;
use colored::Colorize;
use std::path::Path;

/// Validate `path` against the configured rules
pub fn run(config: &Config, path: &Path) -> Result<()> {
    let candidate = CandidateFile::from_path(path)?;
    let file = config.validation_rules().validate(candidate)?;

    println!(
        "{} {} ({}) is ready to upload",
        "✓".green(),
        file.name(),
        format_bytes(file.size_bytes())
    );

    Ok(())
}
