//! Transcoding backends.
//!
//! This module provides the `TranscodeBackend` trait and its two
//! implementations:
//!
//! - [`FfmpegBackend`]: stages the input in a private work dir, runs ffmpeg
//!   and reads the output back, always cleaning up the staged files.
//! - [`RemoteBackend`]: uploads the file to an HTTP conversion service and
//!   returns the location of the converted file.
//!
//! Which one is used is decided once, from configuration, by [`create_backend`].
//!
//! # Example
//!
//! ```ignore
//! use konverter_core::backend::{create_backend, BackendConfig, ConversionJob};
//!
//! let backend = create_backend(&BackendConfig::default())?;
//! backend.validate().await?;
//!
//! let job = ConversionJob {
//!     job_id: "job-1".to_string(),
//!     file: FileRef::from_path("/music/intro.wav"),
//!     settings: Settings::default(),
//!     output_name: "intro.mp3".to_string(),
//! };
//! let result = backend.convert(job).await?;
//! ```

mod config;
mod error;
mod ffmpeg;
mod remote;
mod traits;
mod types;

pub use config::{BackendConfig, BackendKind, LocalBackendConfig, RemoteBackendConfig};
pub use error::TranscodeError;
pub use ffmpeg::FfmpegBackend;
pub use remote::RemoteBackend;
pub use traits::TranscodeBackend;
pub use types::{ConversionJob, ConversionResult, Payload, RemoteConvertResponse};

use std::sync::Arc;

/// Builds the configured backend.
pub fn create_backend(config: &BackendConfig) -> Result<Arc<dyn TranscodeBackend>, TranscodeError> {
    match config.kind {
        BackendKind::Local => Ok(Arc::new(FfmpegBackend::new(config.local.clone()))),
        BackendKind::Remote => {
            let remote = config.remote.clone().ok_or_else(|| {
                TranscodeError::not_ready("remote backend selected but [backend.remote] is missing")
            })?;
            Ok(Arc::new(RemoteBackend::new(remote)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_local_backend() {
        let backend = create_backend(&BackendConfig::default()).unwrap();
        assert_eq!(backend.name(), "ffmpeg");
    }

    #[test]
    fn test_create_remote_backend() {
        let config = BackendConfig {
            kind: BackendKind::Remote,
            remote: Some(RemoteBackendConfig::new("http://localhost:3000/mp3konverter")),
            ..Default::default()
        };
        let backend = create_backend(&config).unwrap();
        assert_eq!(backend.name(), "remote");
    }

    #[test]
    fn test_create_remote_backend_without_config() {
        let config = BackendConfig {
            kind: BackendKind::Remote,
            ..Default::default()
        };
        let err = create_backend(&config).err().unwrap();
        assert!(err.is_unavailable());
    }
}
