//! Configuration for delivery.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where converted files are saved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Directory receiving the converted files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Timeout for fetching a remote result, in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./converted")
}

fn default_download_timeout() -> u64 {
    120
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

impl DeliveryConfig {
    /// Creates a config saving into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }
}
