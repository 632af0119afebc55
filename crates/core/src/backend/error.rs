//! Error types for the transcoding backends.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while transcoding one file.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// Backend has not been initialized or failed its readiness check.
    #[error("Backend not ready: {reason}")]
    NotReady { reason: String },

    /// The conversion service could not be reached.
    #[error("Conversion service unreachable: {reason}")]
    Unreachable { reason: String },

    /// Input could not be read or staged.
    #[error("Failed to stage input {name}: {source}")]
    StagingFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Conversion process failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// The conversion service reported a failure with a message of its own.
    #[error("{message}")]
    Service { message: String },

    /// The conversion service answered with a non-success status and no message.
    #[error("HTTP {status}")]
    Http { status: u16 },

    /// The conversion service answered with something we could not understand.
    #[error("Invalid response from conversion service: {reason}")]
    InvalidResponse { reason: String },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscodeError {
    /// Creates a new conversion failed error with stderr output.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new not-ready error.
    pub fn not_ready(reason: impl Into<String>) -> Self {
        Self::NotReady {
            reason: reason.into(),
        }
    }

    /// Whether the backend itself is unavailable, as opposed to this file failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::FfmpegNotFound { .. } | Self::NotReady { .. } | Self::Unreachable { .. }
        )
    }
}

impl From<reqwest::Error> for TranscodeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Unreachable {
                reason: format!("request timed out: {}", e),
            }
        } else if e.is_connect() {
            Self::Unreachable {
                reason: e.to_string(),
            }
        } else if e.is_decode() {
            Self::InvalidResponse {
                reason: e.to_string(),
            }
        } else {
            Self::ConversionFailed {
                reason: e.to_string(),
                stderr: None,
            }
        }
    }
}
