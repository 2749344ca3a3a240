//! `twin config` command implementation

use crate::api::HttpBackend;
use crate::config::{Config, CONFIG_PATH_ENV};
use crate::error::Result;
use colored::Colorize;

/// Show the effective configuration and whether the server answers
pub async fn show(config: &Config) -> Result<()> {
    println!("{}", "Twin CLI Configuration:".cyan().bold());
    println!();
    for (key, value) in entries(config) {
        println!("{:<22} {}", format!("{}:", key), value);
    }

    let reachable = HttpBackend::from_config(config)?.health_check().await;
    let status = if reachable {
        "reachable".green()
    } else {
        "unreachable".red()
    };
    println!("{:<22} {}", "server:", status);
    println!();
    println!("{}", "Environment Variables:".cyan());
    println!("  TWIN_SERVER_URL          - Ingestion API base URL");
    println!("  TWIN_API_TOKEN           - Bearer token");
    println!("  TWIN_API_TIMEOUT_SECS    - Request timeout");
    println!("  TWIN_POLL_INTERVAL_SECS  - Seconds between status checks");
    println!("  TWIN_MAX_ATTEMPTS        - Status checks before giving up");
    println!("  TWIN_TRANSIENT_RETRIES   - Transient poll failures tolerated");
    println!("  {:<24} - Config file path", CONFIG_PATH_ENV);

    Ok(())
}

/// Print where the config file is read from
pub fn path() -> Result<()> {
    match Config::resolved_path() {
        Some(path) => {
            let state = if path.is_file() { "" } else { " (not present)" };
            println!("{}{}", path.display(), state);
        },
        None => println!("No config directory available on this platform"),
    }
    Ok(())
}

fn entries(config: &Config) -> Vec<(&'static str, String)> {
    vec![
        ("server_url", config.server_url().to_string()),
        (
            "api_token",
            if config.api_token().is_some() {
                "(set)".to_string()
            } else {
                "(not set)".to_string()
            },
        ),
        ("request_timeout_secs", config.request_timeout_secs.to_string()),
        ("poll_interval_secs", config.poll_interval_secs.to_string()),
        ("max_attempts", config.max_attempts.to_string()),
        ("progress_step", config.progress_step.to_string()),
        ("progress_ceiling", config.progress_ceiling.to_string()),
        ("transient_retries", config.transient_retries.to_string()),
        ("allowed_extensions", config.allowed_extensions.join(", ")),
        ("max_upload_bytes", config.max_upload_bytes.to_string()),
    ]
}
