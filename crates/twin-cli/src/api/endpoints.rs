//! API endpoint URL builders

/// Build file upload URL
pub fn upload_url(base_url: &str) -> String {
    format!("{}/upload/", trim_base(base_url))
}

/// Build task status URL
pub fn task_status_url(base_url: &str, task_id: &str) -> String {
    format!(
        "{}/upload/status/{}",
        trim_base(base_url),
        urlencoding::encode(task_id)
    )
}

/// Build health check URL
pub fn health_url(base_url: &str) -> String {
    format!("{}/health", trim_base(base_url))
}

fn trim_base(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}
