//! Error types for the delivery module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while delivering a converted file.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The remote location could not be turned into a URL.
    #[error("Invalid download location {location}: {reason}")]
    InvalidLocation { location: String, reason: String },

    /// A remote payload was produced but no remote base URL is configured.
    #[error("No remote base URL configured to resolve {location}")]
    RemoteNotConfigured { location: String },

    /// Fetching the converted file failed.
    #[error("Download failed: {reason}")]
    DownloadFailed { reason: String },

    /// The download answered with a non-success status.
    #[error("Download failed: HTTP {status}")]
    DownloadStatus { status: u16 },

    /// Failed to create the output directory.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the file.
    #[error("Failed to save {path}")]
    SaveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        Self::DownloadFailed {
            reason: e.to_string(),
        }
    }
}
