//! Twin CLI - Main entry point

use clap::Parser;
use std::process;
use tracing::error;
use twin_cli::{Cli, Commands, ConfigCommand};
use twin_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};

#[tokio::main]
async fn main() {
    // A missing .env is the normal case
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Verbose: debug to the console. Otherwise warnings only, so progress
    // output stays readable.
    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Warn })
        .output(LogOutput::Console)
        .log_file_prefix("twin-cli")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);

    // The CLI works without logging
    let _log_guard = init_logging(&log_config).ok();

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> twin_cli::Result<()> {
    let config = cli.resolve_config()?;

    match &cli.command {
        Commands::Upload {
            path,
            poll_interval_secs,
            max_attempts,
            json,
        } => {
            let options = twin_cli::commands::upload::UploadOptions {
                poll_interval_secs: *poll_interval_secs,
                max_attempts: *max_attempts,
                json: *json,
            };
            twin_cli::commands::upload::run(&config, path, options).await
        },

        Commands::Status { task_id, json } => {
            twin_cli::commands::status::run(&config, task_id, *json).await
        },

        Commands::Check { path } => twin_cli::commands::check::run(&config, path),

        Commands::Config { command } => match command {
            ConfigCommand::Show => twin_cli::commands::config::show(&config).await,
            ConfigCommand::Path => twin_cli::commands::config::path(),
        },
    }
}
