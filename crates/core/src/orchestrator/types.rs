//! Types for the conversion orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::TranscodeError;
use crate::delivery::{DeliveredFile, DeliveryError};
use crate::queue::{QueueError, QueuedFileSummary};
use crate::settings::{OutputFormat, Settings};

/// Lifecycle of the current batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    Completed,
    FailedAwaitingRetry,
}

impl BatchState {
    /// Snake case name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::FailedAwaitingRetry => "failed_awaiting_retry",
        }
    }
}

/// How a status message should be presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// The most recent orchestrator event, as shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub text: String,
    pub severity: Severity,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, severity: Severity) -> Self {
        Self {
            text: text.into(),
            severity,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Info)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Success)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Warning)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, Severity::Error)
    }
}

/// Aggregate progress of the current batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressState {
    /// Files fully converted and delivered.
    pub completed_count: usize,
    /// Files in the batch.
    pub total_count: usize,
    /// 0..=100, never decreasing within a batch.
    pub percent: u8,
    /// Whether the progress bar is shown.
    pub showing: bool,
}

/// `done / total` as a percentage, rounded half up.
pub fn percent_of(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = done.min(total);
    ((done * 200 + total) / (2 * total)) as u8
}

/// Everything an observer can read about the orchestrator.
#[derive(Debug, Clone, Serialize)]
pub struct OrchestratorSnapshot {
    pub state: BatchState,
    pub files: Vec<QueuedFileSummary>,
    pub settings: Settings,
    pub output_format: OutputFormat,
    pub progress: ProgressState,
    pub status: StatusMessage,
    pub show_retry: bool,
    pub files_completed: usize,
    /// Name of the configured backend.
    pub backend: String,
    pub backend_ready: bool,
    /// Files delivered by the current batch.
    pub deliveries: Vec<DeliveredFile>,
}

/// Outcome of a batch that converted every file.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub converted: usize,
    pub deliveries: Vec<DeliveredFile>,
}

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Nothing usable was selected, or a batch was started with an empty queue.
    #[error("{reason}")]
    InvalidSelection { reason: String },

    /// The backend is not ready or could not be reached.
    #[error("{reason}")]
    BackendUnavailable { reason: String },

    /// The backend failed to convert a file.
    #[error("Conversion of {file} failed: {source}")]
    TranscodeFailure {
        file: String,
        #[source]
        source: TranscodeError,
    },

    /// The converted file could not be delivered.
    #[error("Conversion of {file} failed: {source}")]
    DeliveryFailure {
        file: String,
        #[source]
        source: DeliveryError,
    },

    /// A batch is already in flight.
    #[error("a conversion is already running")]
    AlreadyRunning,

    /// Settings cannot change while a batch is running.
    #[error("settings cannot be changed while a conversion is running")]
    SettingsLocked,

    /// Settings were rejected.
    #[error("invalid settings: {reason}")]
    InvalidSettings { reason: String },

    /// Entries cannot be removed while a batch is running.
    #[error("the queue cannot be changed while a conversion is running")]
    QueueLocked,

    /// Index does not address a queue entry.
    #[error("no file at index {index} (queue has {len})")]
    InvalidIndex { index: usize, len: usize },
}

impl OrchestratorError {
    /// Severity this error is reported with when it ends up in the status.
    pub fn severity(&self) -> Severity {
        match self {
            Self::InvalidSelection { .. }
            | Self::AlreadyRunning
            | Self::SettingsLocked
            | Self::InvalidSettings { .. }
            | Self::QueueLocked
            | Self::InvalidIndex { .. } => Severity::Warning,
            Self::BackendUnavailable { .. }
            | Self::TranscodeFailure { .. }
            | Self::DeliveryFailure { .. } => Severity::Error,
        }
    }

    /// Whether this error ended a running batch.
    pub fn aborts_batch(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl From<QueueError> for OrchestratorError {
    fn from(e: QueueError) -> Self {
        match e {
            QueueError::NoAudioFiles => Self::InvalidSelection {
                reason: "No valid audio files selected".to_string(),
            },
            QueueError::IndexOutOfRange { index, len } => Self::InvalidIndex { index, len },
        }
    }
}
