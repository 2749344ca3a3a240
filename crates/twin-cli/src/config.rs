//! Configuration management for the Twin CLI
//!
//! Settings are resolved from, in increasing precedence: built-in defaults,
//! an optional TOML file, `TWIN_*` environment variables, and command-line
//! flags (applied by the caller).

use crate::api::client::{DEFAULT_API_TIMEOUT_SECS, DEFAULT_SERVER_URL};
use crate::error::{CliError, Result};
use crate::tracker::{
    PollPolicy, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_PROGRESS_CEILING,
    DEFAULT_PROGRESS_STEP,
};
use crate::validation::{ValidationRules, DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_UPLOAD_BYTES};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Environment variable pointing at an explicit config file
pub const CONFIG_PATH_ENV: &str = "TWIN_CONFIG";

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Ingestion API base URL
    pub server_url: String,

    /// Bearer token sent with every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Delay between status checks
    pub poll_interval_secs: u64,

    /// Status checks before giving up
    pub max_attempts: u32,

    /// Progress added per in-progress status check
    pub progress_step: u8,

    /// Highest progress shown before the backend reports completion
    pub progress_ceiling: u8,

    /// Consecutive transient poll failures tolerated (0 fails on the first)
    pub transient_retries: u32,

    /// Accepted file extensions
    pub allowed_extensions: Vec<String>,

    /// Largest accepted upload
    pub max_upload_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_token: None,
            request_timeout_secs: DEFAULT_API_TIMEOUT_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            progress_step: DEFAULT_PROGRESS_STEP,
            progress_ceiling: DEFAULT_PROGRESS_CEILING,
            transient_retries: 0,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Default config file location (`<config dir>/twin/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("twin").join("config.toml"))
    }

    /// Path that [`Config::load`] reads, if any
    pub fn resolved_path() -> Option<PathBuf> {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .or_else(Self::default_path)
    }

    /// Parse a TOML config file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CliError::config(format!("Cannot read config file '{}': {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the config file if present, then environment
    pub fn load() -> Result<Self> {
        let base = match Self::resolved_path() {
            Some(path) if path.is_file() => {
                debug!(path = %path.display(), "Loading config file");
                Self::from_file(&path)?
            },
            Some(path) if std::env::var_os(CONFIG_PATH_ENV).is_some() => {
                return Err(CliError::config(format!(
                    "{} points to '{}', which is not a readable file",
                    CONFIG_PATH_ENV,
                    path.display()
                )));
            },
            _ => Self::default(),
        };

        base.merge_env()
    }

    /// Load config from environment variables only
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Overlay `TWIN_*` environment variables
    pub fn merge_env(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var("TWIN_SERVER_URL") {
            self.server_url = url;
        }

        if let Ok(token) = std::env::var("TWIN_API_TOKEN") {
            self.api_token = Some(token).filter(|t| !t.is_empty());
        }

        if let Some(secs) = env_parse("TWIN_API_TIMEOUT_SECS")? {
            self.request_timeout_secs = secs;
        }

        if let Some(secs) = env_parse("TWIN_POLL_INTERVAL_SECS")? {
            self.poll_interval_secs = secs;
        }

        if let Some(attempts) = env_parse("TWIN_MAX_ATTEMPTS")? {
            self.max_attempts = attempts;
        }

        if let Some(retries) = env_parse("TWIN_TRANSIENT_RETRIES")? {
            self.transient_retries = retries;
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(CliError::config("server_url must not be empty"));
        }
        if self.progress_ceiling > 100 {
            return Err(CliError::config(format!(
                "progress_ceiling must be at most 100, got {}",
                self.progress_ceiling
            )));
        }
        if self.allowed_extensions.is_empty() {
            return Err(CliError::config("allowed_extensions must not be empty"));
        }
        Ok(())
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn set_server_url(&mut self, url: String) {
        self.server_url = url;
    }

    pub fn api_token(&self) -> Option<&str> {
        self.api_token.as_deref()
    }

    pub fn set_api_token(&mut self, token: Option<String>) {
        self.api_token = token;
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy::default()
            .with_interval(Duration::from_secs(self.poll_interval_secs))
            .with_max_attempts(self.max_attempts)
            .with_progress_step(self.progress_step)
            .with_progress_ceiling(self.progress_ceiling)
            .with_transient_retries(self.transient_retries)
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules::new(&self.allowed_extensions, self.max_upload_bytes)
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| CliError::config(format!("{}={:?} is invalid: {}", key, raw, e))),
        Err(_) => Ok(None),
    }
}
