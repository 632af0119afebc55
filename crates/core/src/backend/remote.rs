//! Remote backend talking to an HTTP conversion service.

use async_trait::async_trait;
use reqwest::{multipart, Client, Url};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::settings::{FIXED_CHANNELS, FIXED_SAMPLE_RATE};

use super::config::RemoteBackendConfig;
use super::error::TranscodeError;
use super::traits::TranscodeBackend;
use super::types::{ConversionJob, ConversionResult, Payload, RemoteConvertResponse};

/// Message used when the service reports failure without saying why.
const GENERIC_FAILURE: &str = "conversion failed";

/// Backend that uploads files to a conversion service.
///
/// The returned payload is the service-side location of the converted file;
/// fetching it is left to the delivery channel.
pub struct RemoteBackend {
    client: Client,
    config: RemoteBackendConfig,
}

impl RemoteBackend {
    /// Creates a new remote backend with the given configuration.
    pub fn new(config: RemoteBackendConfig) -> Result<Self, TranscodeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TranscodeError::not_ready(format!("failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// Builds the multipart body for one job.
    fn build_form(job: &ConversionJob, bytes: Vec<u8>) -> Result<multipart::Form, TranscodeError> {
        let mut part = multipart::Part::bytes(bytes).file_name(job.file.name.clone());
        if let Some(media_type) = &job.file.media_type {
            part = part
                .mime_str(media_type)
                .map_err(|e| TranscodeError::conversion_failed(e.to_string(), None))?;
        }

        Ok(multipart::Form::new()
            .part("file", part)
            .text("format", job.settings.extension().to_string())
            .text("bitrate", job.settings.bitrate.clone())
            .text("samplerate", FIXED_SAMPLE_RATE.to_string())
            .text("channels", FIXED_CHANNELS.to_string()))
    }

    /// Turns an error response into a [`TranscodeError`], preferring the server's message.
    fn error_from_body(status: u16, body: &str) -> TranscodeError {
        match serde_json::from_str::<RemoteConvertResponse>(body)
            .ok()
            .and_then(|r| r.error)
        {
            Some(message) => TranscodeError::Service { message },
            None => TranscodeError::Http { status },
        }
    }
}

#[async_trait]
impl TranscodeBackend for RemoteBackend {
    fn name(&self) -> &str {
        "remote"
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        let url = Url::parse(self.config.base()).map_err(|e| {
            TranscodeError::not_ready(format!("invalid base_url {:?}: {}", self.config.base_url, e))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(TranscodeError::not_ready(format!(
                "unsupported scheme in base_url: {}",
                url.scheme()
            )));
        }
        Ok(())
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, TranscodeError> {
        let start = Instant::now();
        let bytes = job
            .file
            .source
            .read()
            .await
            .map_err(|source| TranscodeError::StagingFailed {
                name: job.file.name.clone(),
                source,
            })?;

        let form = Self::build_form(&job, bytes)?;
        let url = self.config.convert_url();
        debug!(job_id = %job.job_id, url = %url, file = %job.file.name, "Uploading to conversion service");

        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(Self::error_from_body(status.as_u16(), &body));
        }

        let parsed: RemoteConvertResponse =
            serde_json::from_str(&body).map_err(|e| TranscodeError::InvalidResponse {
                reason: format!("Failed to parse response: {}", e),
            })?;

        if !parsed.ok {
            return Err(TranscodeError::Service {
                message: parsed.error.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            });
        }

        let location = parsed.url.ok_or_else(|| TranscodeError::InvalidResponse {
            reason: "response has ok=true but no url".to_string(),
        })?;

        if let Some(server_name) = parsed.filename.as_deref() {
            if server_name != job.output_name {
                debug!(
                    server_name = server_name,
                    output_name = %job.output_name,
                    "Ignoring service-provided filename"
                );
            }
        }

        Ok(ConversionResult {
            job_id: job.job_id,
            payload: Payload::Remote(location),
            output_name: job.output_name,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}
