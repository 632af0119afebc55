pub mod backend;
pub mod config;
pub mod delivery;
pub mod feedback;
pub mod filename;
pub mod metrics;
pub mod orchestrator;
pub mod queue;
pub mod settings;
pub mod testing;

pub use backend::{
    create_backend, BackendConfig, BackendKind, ConversionJob, ConversionResult, FfmpegBackend,
    LocalBackendConfig, Payload, RemoteBackend, RemoteBackendConfig, TranscodeBackend,
    TranscodeError,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use delivery::{DeliveredFile, DeliveryChannel, DeliveryConfig, DeliveryError, DiskDelivery};
pub use feedback::{create_feedback, DesktopFeedback, FeedbackConfig, FeedbackService, NoopFeedback};
pub use filename::derive_output_name;
pub use orchestrator::{
    BatchState, BatchSummary, ConversionOrchestrator, OrchestratorConfig, OrchestratorError,
    OrchestratorSnapshot, PreparedBatch, ProgressState, Severity, StateUpdateCallback,
    StatusMessage,
};
pub use queue::{
    AddOutcome, FileQueue, FileRef, FileStatus, QueueError, QueuedFile, QueuedFileSummary,
};
pub use settings::{Codec, OutputFormat, Settings};
