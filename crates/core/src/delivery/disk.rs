//! Delivery into a local directory.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::backend::{ConversionResult, Payload};
use crate::metrics::{CLEANUP_WARNINGS, DELIVERED_BYTES, DELIVERIES_TOTAL};
use crate::settings::OutputFormat;

use super::config::DeliveryConfig;
use super::error::DeliveryError;
use super::resolve::{extension_of, mime_for_extension, resolve_location};
use super::traits::DeliveryChannel;
use super::types::DeliveredFile;

/// Remote service a [`Payload::Remote`] location is resolved against.
struct RemoteSource {
    base_url: String,
    client: Client,
}

/// Saves converted files into the configured output directory.
///
/// Bytes are written to a `.part` file first and renamed into place, so a
/// file with the final name is always complete. Existing files are never
/// replaced: a clashing name gets a ` (n)` suffix before the extension.
pub struct DiskDelivery {
    config: DeliveryConfig,
    remote: Option<RemoteSource>,
}

impl DiskDelivery {
    /// Creates a delivery that only accepts in-memory payloads.
    pub fn new(config: DeliveryConfig) -> Self {
        Self {
            config,
            remote: None,
        }
    }

    /// Enables fetching remote payloads from the conversion service at `base_url`.
    pub fn with_remote(mut self, base_url: impl Into<String>) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.download_timeout_secs))
            .build()?;
        self.remote = Some(RemoteSource {
            base_url: base_url.into(),
            client,
        });
        Ok(self)
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    async fn fetch(&self, location: &str) -> Result<Vec<u8>, DeliveryError> {
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| DeliveryError::RemoteNotConfigured {
                location: location.to_string(),
            })?;

        let url = resolve_location(&remote.base_url, location)?;
        debug!(url = %url, "Fetching converted file");

        let response = remote.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::DownloadStatus {
                status: status.as_u16(),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// First name in the output directory not taken by an existing file.
    async fn free_name(&self, name: &str) -> Result<String, DeliveryError> {
        let dir = &self.config.output_dir;
        let mut candidate = name.to_string();
        let mut n = 0;
        loop {
            let path = dir.join(&candidate);
            let taken = tokio::fs::try_exists(&path)
                .await
                .map_err(|source| DeliveryError::SaveFailed { path, source })?;
            if !taken {
                return Ok(candidate);
            }
            n += 1;
            candidate = numbered_name(name, n);
        }
    }

    /// Saves `bytes` under `name` or the first free numbered variant of it.
    ///
    /// Returns the name and path the file ended up under.
    async fn save(&self, name: &str, bytes: &[u8]) -> Result<(String, PathBuf), DeliveryError> {
        let dir = &self.config.output_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| DeliveryError::OutputDirectoryFailed {
                path: dir.clone(),
                source,
            })?;

        let saved_name = self.free_name(name).await?;
        if saved_name != name {
            debug!(requested = name, file = %saved_name, "Output name taken, saving under a numbered name");
        }
        let final_path = dir.join(&saved_name);
        let part_path = dir.join(format!(".{}.part", saved_name));

        let written = async {
            tokio::fs::write(&part_path, bytes).await?;
            tokio::fs::rename(&part_path, &final_path).await
        }
        .await;

        if let Err(source) = written {
            match tokio::fs::remove_file(&part_path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %part_path.display(), error = %e, "Failed to remove partial file");
                    CLEANUP_WARNINGS.inc();
                }
            }
            return Err(DeliveryError::SaveFailed {
                path: final_path,
                source,
            });
        }

        Ok((saved_name, final_path))
    }
}

/// `song.mp3` → `song (n).mp3`.
fn numbered_name(name: &str, n: usize) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", name, n),
    }
}

/// Keeps only the last path component of an output name.
fn safe_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "audio".to_string())
}

#[async_trait]
impl DeliveryChannel for DiskDelivery {
    fn name(&self) -> &str {
        "disk"
    }

    async fn deliver(
        &self,
        result: ConversionResult,
        format: &OutputFormat,
    ) -> Result<DeliveredFile, DeliveryError> {
        let name = safe_name(&result.output_name);

        let outcome = async {
            let bytes = match result.payload {
                Payload::Bytes(bytes) => bytes,
                Payload::Remote(location) => self.fetch(&location).await?,
            };
            let (saved_name, path) = self.save(&name, &bytes).await?;
            Ok::<_, DeliveryError>((saved_name, path, bytes.len() as u64))
        }
        .await;

        let (name, path, size_bytes) = match outcome {
            Ok(saved) => saved,
            Err(e) => {
                DELIVERIES_TOTAL.with_label_values(&["failed"]).inc();
                return Err(e);
            }
        };

        DELIVERIES_TOTAL.with_label_values(&["success"]).inc();
        DELIVERED_BYTES.inc_by(size_bytes);

        let mime = extension_of(&name)
            .map(mime_for_extension)
            .unwrap_or(format.mime)
            .to_string();

        info!(file = %name, path = %path.display(), size_bytes, "Delivered converted file");

        Ok(DeliveredFile {
            name,
            path,
            mime,
            size_bytes,
            delivered_at: Utc::now(),
        })
    }
}
