//! Error types for the Twin CLI
//!
//! User-facing errors with messages that say what went wrong and what to do
//! about it.

use crate::api::backend::TransportError;
use crate::validation::ValidationError;
use thiserror::Error;
use twin_common::{FailureKind, TwinError};

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Comprehensive error type for CLI operations
#[derive(Error, Debug)]
pub enum CliError {
    /// File rejected locally, nothing was sent
    #[error("Cannot upload: {0}")]
    Validation(#[from] ValidationError),

    /// Talking to the ingestion server failed
    #[error("Server error: {0}. Check that the server is reachable with 'twin config show'.")]
    Transport(#[from] TransportError),

    /// The ingestion task reached a failed terminal phase
    #[error("Ingestion failed ({kind}): {detail}")]
    IngestionFailed { kind: FailureKind, detail: String },

    /// A task id or other shared value was malformed
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] TwinError),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}. Check your TWIN_* environment variables or config file.")]
    Config(String),

    /// File system operation failed
    #[error("File operation failed: {0}. Check that the path exists and is readable.")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or used
    #[error("Network request failed: {0}. Check your internet connection and server URL.")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failed
    #[error("Failed to process JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Config file syntax error
    #[error("Failed to parse config file: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Generic anyhow error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CliError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an ingestion failure error
    pub fn ingestion_failed(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::IngestionFailed {
            kind,
            detail: detail.into(),
        }
    }
}
