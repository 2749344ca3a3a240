//! HTTP client for the ingestion backend
//!
//! Implements [`IngestBackend`] over the REST API: multipart upload to
//! `/upload/` and status checks at `/upload/status/{task_id}`.

use crate::api::backend::{IngestBackend, StatusReport, Submission, TransportError};
use crate::api::endpoints;
use crate::api::types::{ErrorBody, TaskStatusPayload, UploadAccepted};
use crate::config::Config;
use crate::error::Result;
use crate::validation::ValidatedFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use std::time::Duration;
use tracing::{debug, instrument};
use twin_common::TaskId;

// ============================================================================
// API Client Constants
// ============================================================================

/// Default timeout for API requests in seconds.
/// Uploads of up to 100 MiB go through a single request.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 300;

/// Default ingestion API base URL
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000/api";

/// Health checks should answer quickly even when uploads may take minutes
const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

/// Multipart field carrying the file body
const UPLOAD_FIELD: &str = "file";

/// reqwest-backed ingestion backend
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Create a client with the default request timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_API_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: None,
        })
    }

    /// Create from resolved CLI configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend = Self::with_timeout(config.server_url(), config.request_timeout())?;
        Ok(match config.api_token() {
            Some(token) => backend.with_token(token),
            None => backend,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether `GET {base}/health` answers with a 2xx status
    pub async fn health_check(&self) -> bool {
        let url = endpoints::health_url(&self.base_url);
        let request = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS));

        match self.authorize(request).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Turn a non-2xx response into [`TransportError::Status`]
    async fn ensure_success(response: Response) -> std::result::Result<Response, TransportError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail_text())
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "request failed".to_string());

        Err(TransportError::Status {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl IngestBackend for HttpBackend {
    #[instrument(skip_all, fields(file = %file.name(), size = file.size_bytes()))]
    async fn submit(
        &self,
        file: &ValidatedFile,
    ) -> std::result::Result<Submission, TransportError> {
        let url = endpoints::upload_url(&self.base_url);

        let bytes = file
            .read_bytes()
            .await
            .map_err(|e| TransportError::Read(e.to_string()))?;
        let part = Part::bytes(bytes)
            .file_name(file.name().to_string())
            .mime_str(mime_for(file.extension()))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        debug!(url = %url, "Uploading file");
        let response = self
            .authorize(self.client.post(&url))
            .multipart(form)
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;

        let accepted: UploadAccepted = response.json().await?;
        Submission::try_from(accepted)
    }

    #[instrument(skip_all, fields(task_id = %task_id))]
    async fn poll_status(
        &self,
        task_id: &TaskId,
    ) -> std::result::Result<StatusReport, TransportError> {
        let url = endpoints::task_status_url(&self.base_url, task_id.as_str());

        let response = self.authorize(self.client.get(&url)).send().await?;
        let response = Self::ensure_success(response).await?;

        let payload: TaskStatusPayload = response.json().await?;
        debug!(status = %payload.status, "Received task status");
        StatusReport::try_from(payload)
    }
}

fn mime_for(extension: &str) -> &'static str {
    match extension {
        ".txt" => "text/plain",
        ".json" => "application/json",
        ".csv" => "text/csv",
        ".html" => "text/html",
        ".zip" => "application/zip",
        _ => "application/octet-stream",
    }
}
