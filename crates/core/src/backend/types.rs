//! Types for the transcoding backends.

use serde::{Deserialize, Serialize};

use crate::queue::FileRef;
use crate::settings::Settings;

/// One file to convert with the settings snapshot of its batch.
///
/// Lives only for the duration of a single backend call.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    /// Unique job identifier, used for logging and scratch space naming.
    pub job_id: String,
    /// The input file.
    pub file: FileRef,
    /// Settings snapshot taken when the batch started.
    pub settings: Settings,
    /// Output filename derived from the original name and settings.
    pub output_name: String,
}

/// Where the converted content can be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Converted bytes held in memory.
    Bytes(Vec<u8>),
    /// A location on the conversion service, possibly relative to its base URL.
    Remote(String),
}

impl Payload {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bytes(_) => "bytes",
            Self::Remote(_) => "remote",
        }
    }
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    /// Job ID this result belongs to.
    pub job_id: String,
    /// The converted content.
    pub payload: Payload,
    /// Filename to deliver the content under.
    pub output_name: String,
    /// Conversion duration in milliseconds.
    pub duration_ms: u64,
}

/// JSON body returned by the remote conversion service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConvertResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
