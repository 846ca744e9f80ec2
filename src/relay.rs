// Relay test client: sends a local file to the PUT conversion endpoint over
// HTTP, the way `curl -T` would, and stores what comes back.

use headers::HeaderMapExt;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::conversion::filename;
use crate::web::AttachmentDisposition;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Response status code:{0}")]
    UpstreamStatus(u16),

    #[error("Could not reach {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("Request to {endpoint} timed out after {timeout:?}")]
    Timeout { endpoint: String, timeout: Duration },

    #[error("Failed to read source file {}: {source}", path.display())]
    ReadSource {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write output file {}: {source}", path.display())]
    WriteOutput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

/// One relay run, built from the four test form fields.
#[derive(Debug, Clone)]
pub struct RelayJob {
    pub source_name: String,
    pub source: PathBuf,
    pub output: PathBuf,
}

impl RelayJob {
    /// Both file names are sanitized; the directories are used as given.
    pub fn new(
        source_dir: impl AsRef<Path>,
        source_name: &str,
        output_dir: impl AsRef<Path>,
        output_name: &str,
    ) -> Self {
        let source_name = filename::normalize(source_name);
        let output_name = filename::normalize(output_name);
        Self {
            source: source_dir.as_ref().join(&source_name),
            output: output_dir.as_ref().join(output_name),
            source_name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayOutcome {
    pub endpoint: String,
    pub status: u16,
    pub source: PathBuf,
    pub output: PathBuf,
    /// Download name announced by the upstream `Content-Disposition`.
    pub upstream_file_name: Option<String>,
    pub bytes_written: usize,
}

#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl RelayClient {
    pub fn new(timeout: Duration) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Client(e.to_string()))?;

        Ok(Self { http, timeout })
    }

    /// Makes exactly one PUT to `<base_url>/convert_from_curl/<source name>`.
    ///
    /// Only a 200 response is written to `job.output`; any other status is
    /// returned as [`RelayError::UpstreamStatus`]. Failing to get a response
    /// at all is reported separately as `Transport` or `Timeout`.
    pub async fn relay(&self, base_url: &str, job: &RelayJob) -> Result<RelayOutcome, RelayError> {
        let endpoint = format!(
            "{}/convert_from_curl/{}",
            base_url.trim_end_matches('/'),
            job.source_name
        );

        let data = tokio::fs::read(&job.source)
            .await
            .map_err(|source| RelayError::ReadSource {
                path: job.source.clone(),
                source,
            })?;

        info!(
            "Relaying {} ({} bytes) to {}",
            job.source.display(),
            data.len(),
            endpoint
        );

        let response = self
            .http
            .put(&endpoint)
            .body(data)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e, &endpoint))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Relay to {} failed with status {}", endpoint, status);
            return Err(RelayError::UpstreamStatus(status.as_u16()));
        }

        let upstream_file_name = response
            .headers()
            .typed_get::<AttachmentDisposition>()
            .map(|AttachmentDisposition(name)| name);

        let body = response
            .bytes()
            .await
            .map_err(|e| self.map_reqwest_error(e, &endpoint))?;

        tokio::fs::write(&job.output, &body)
            .await
            .map_err(|source| RelayError::WriteOutput {
                path: job.output.clone(),
                source,
            })?;

        debug!("Wrote {} bytes to {}", body.len(), job.output.display());

        Ok(RelayOutcome {
            endpoint,
            status: status.as_u16(),
            source: job.source.clone(),
            output: job.output.clone(),
            upstream_file_name,
            bytes_written: body.len(),
        })
    }

    fn map_reqwest_error(&self, e: reqwest::Error, endpoint: &str) -> RelayError {
        if e.is_timeout() {
            RelayError::Timeout {
                endpoint: endpoint.to_string(),
                timeout: self.timeout,
            }
        } else {
            RelayError::Transport {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        }
    }
}
