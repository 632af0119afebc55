//! Types for the delivery module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A file that was handed to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveredFile {
    /// Name the file was saved under.
    pub name: String,
    /// Where it ended up.
    pub path: PathBuf,
    /// MIME type derived from the extension.
    pub mime: String,
    /// Size in bytes.
    pub size_bytes: u64,
    /// When the delivery finished.
    pub delivered_at: DateTime<Utc>,
}
