//! Conversion orchestrator.
//!
//! The orchestrator owns the file queue, the settings and the batch state
//! machine:
//!
//! ```text
//! Idle ──start──▶ Running ──all files delivered──▶ Completed ──reset delay──▶ Idle
//!                    │
//!                    └──first failure──▶ FailedAwaitingRetry ──retry──▶ Running
//! ```
//!
//! Files are converted strictly one after another through the configured
//! backend; each result is delivered before the next file starts. Retrying
//! restarts the whole queue.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::{ConversionOrchestrator, PreparedBatch, StateUpdateCallback};
pub use types::{
    percent_of, BatchState, BatchSummary, OrchestratorError, OrchestratorSnapshot, ProgressState,
    Severity, StatusMessage,
};
