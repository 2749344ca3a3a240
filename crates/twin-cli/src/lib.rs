//! Twin CLI Library
//!
//! Uploads exported chat histories to the Twin backend, which turns them into
//! personas, and follows the backend's processing job to completion.
//!
//! # Overview
//!
//! - **Validation**: extension and size checks before anything is sent
//!   ([`validation`])
//! - **Backend**: the [`api::IngestBackend`] boundary and its HTTP client
//! - **Tracking**: the submit → poll → resolve state machine ([`tracker`]),
//!   driven by an injectable [`scheduler::Scheduler`] and a cancellation token
//! - **Commands**: `twin upload`, `twin status`, `twin check`, `twin config`
//!
//! # Example
//!
//! ```no_run
//! use tokio_util::sync::CancellationToken;
//! use twin_cli::api::HttpBackend;
//! use twin_cli::observer::NoopObserver;
//! use twin_cli::validation::CandidateFile;
//! use twin_cli::Ingestor;
//!
//! # async fn demo() -> twin_cli::Result<()> {
//! let ingestor = Ingestor::new(HttpBackend::new("http://localhost:8000/api")?);
//! let file = CandidateFile::from_path("wechat-export.zip")?;
//! let task = ingestor
//!     .start_ingestion(file, &NoopObserver, &CancellationToken::new())
//!     .await?;
//! println!("{:?} {:?}", task.phase(), task.result_resource_id());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod ingestor;
pub mod observer;
pub mod progress;
pub mod scheduler;
pub mod task;
pub mod tracker;
pub mod validation;

// Re-export commonly used types
pub use error::{CliError, Result};
pub use ingestor::Ingestor;
pub use task::IngestionTask;
pub use tracker::{IngestionTracker, PollPolicy};

use clap::{Parser, Subcommand};
use config::Config;
use std::path::PathBuf;

/// Twin - chat history ingestion client
#[derive(Parser, Debug)]
#[command(name = "twin")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Ingestion API base URL
    #[arg(long, env = "TWIN_SERVER_URL", global = true)]
    pub server_url: Option<String>,

    /// Bearer token for the ingestion API
    #[arg(long, env = "TWIN_API_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a chat history and wait for the persona to be created
    Upload {
        /// File to upload (.txt, .json, .csv, .html, .zip)
        path: PathBuf,

        /// Seconds between status checks
        #[arg(long)]
        poll_interval_secs: Option<u64>,

        /// Status checks before giving up
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Print the final task as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check the status of an upload task once
    Status {
        /// Task id returned by the upload
        task_id: String,

        /// Print the status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a file locally without uploading it
    Check {
        /// File to check
        path: PathBuf,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Print the config file path
    Path,
}

impl Cli {
    /// Effective configuration: file and environment, then global flags
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load()?;

        if let Some(url) = &self.server_url {
            config.set_server_url(url.clone());
        }

        if let Some(token) = &self.token {
            config.set_api_token(Some(token.clone()));
        }

        Ok(config)
    }
}
