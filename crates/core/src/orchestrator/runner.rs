//! Conversion orchestrator implementation.
//!
//! Drives the queue through the backend one file at a time:
//! - Convert: through the configured [`TranscodeBackend`]
//! - Deliver: through the [`DeliveryChannel`], before the next file starts
//! - Feedback: once, after every file of the batch was delivered

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::backend::{ConversionJob, TranscodeBackend};
use crate::delivery::{DeliveredFile, DeliveryChannel};
use crate::feedback::FeedbackService;
use crate::filename::derive_output_name;
use crate::metrics::{BATCHES_TOTAL, CONVERSIONS_TOTAL, CONVERSION_DURATION};
use crate::queue::{AddOutcome, FileQueue, FileRef, FileStatus, QueuedFileSummary};
use crate::settings::{is_valid_bitrate, OutputFormat, Settings};

use super::config::OrchestratorConfig;
use super::types::{
    percent_of, BatchState, BatchSummary, OrchestratorError, OrchestratorSnapshot, ProgressState,
    StatusMessage,
};

/// Callback invoked with a fresh snapshot after every state change.
pub type StateUpdateCallback = Arc<dyn Fn(&OrchestratorSnapshot) + Send + Sync>;

const STATUS_READY: &str = "Ready - select audio files";
const STATUS_NEW_CONVERSION: &str = "Ready for a new conversion";
const STATUS_NO_AUDIO: &str = "No valid audio files selected";
const STATUS_NO_FILES: &str = "No files selected";
const STATUS_EMPTY_BATCH: &str = "No files selected for conversion";
const STATUS_NOT_READY: &str = "Conversion backend is not ready";

fn selected_status(count: usize) -> StatusMessage {
    StatusMessage::info(format!("{} file(s) selected", count))
}

/// Mutable state behind the orchestrator's lock.
struct OrchestratorState {
    batch: BatchState,
    queue: FileQueue,
    settings: Settings,
    progress: ProgressState,
    status: StatusMessage,
    show_retry: bool,
    files_completed: usize,
    backend_ready: bool,
    deliveries: Vec<DeliveredFile>,
    /// Queue ids taking part in the current (or last) batch.
    batch_ids: Vec<u64>,
    /// Bumped for every started batch so stale resets can be detected.
    generation: u64,
}

impl OrchestratorState {
    fn new(settings: Settings) -> Self {
        Self {
            batch: BatchState::Idle,
            queue: FileQueue::new(),
            settings,
            progress: ProgressState::default(),
            status: StatusMessage::info(STATUS_READY),
            show_retry: false,
            files_completed: 0,
            backend_ready: false,
            deliveries: Vec::new(),
            batch_ids: Vec::new(),
            generation: 0,
        }
    }

    /// Returns to Idle, dropping the finished batch's files.
    ///
    /// Files added while the batch was running are kept.
    fn reset_after_batch(&mut self) {
        let finished = std::mem::take(&mut self.batch_ids);
        self.queue.retain(|entry| !finished.contains(&entry.id));
        self.batch = BatchState::Idle;
        self.progress = ProgressState::default();
        self.files_completed = 0;
        self.show_retry = false;
        self.deliveries.clear();
        self.status = if self.queue.is_empty() {
            StatusMessage::info(STATUS_NEW_CONVERSION)
        } else {
            selected_status(self.queue.len())
        };
    }
}

/// Builds snapshots and hands them to the update callback.
#[derive(Clone)]
struct Publisher {
    backend: String,
    on_update: Option<StateUpdateCallback>,
}

impl Publisher {
    fn snapshot(&self, state: &OrchestratorState) -> OrchestratorSnapshot {
        OrchestratorSnapshot {
            state: state.batch,
            files: state.queue.summaries(),
            settings: state.settings.clone(),
            output_format: state.settings.output_format(),
            progress: state.progress,
            status: state.status.clone(),
            show_retry: state.show_retry,
            files_completed: state.files_completed,
            backend: self.backend.clone(),
            backend_ready: state.backend_ready,
            deliveries: state.deliveries.clone(),
        }
    }

    fn publish(&self, state: &OrchestratorState) {
        if let Some(callback) = &self.on_update {
            callback(&self.snapshot(state));
        }
    }
}

/// A batch that passed the start checks.
///
/// Holds the batch lock until it is run or dropped, so no other batch can
/// start in between.
pub struct PreparedBatch {
    files: Vec<(u64, FileRef)>,
    settings: Settings,
    generation: u64,
    guard: OwnedMutexGuard<()>,
}

impl PreparedBatch {
    /// Number of files in the batch.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// The conversion orchestrator.
pub struct ConversionOrchestrator {
    config: OrchestratorConfig,
    backend: Arc<dyn TranscodeBackend>,
    delivery: Arc<dyn DeliveryChannel>,
    feedback: Arc<dyn FeedbackService>,
    state: Arc<RwLock<OrchestratorState>>,
    batch_lock: Arc<Mutex<()>>,
    reset_task: Mutex<Option<JoinHandle<()>>>,
    publisher: Publisher,
}

impl ConversionOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        config: OrchestratorConfig,
        backend: Arc<dyn TranscodeBackend>,
        delivery: Arc<dyn DeliveryChannel>,
        feedback: Arc<dyn FeedbackService>,
    ) -> Self {
        let publisher = Publisher {
            backend: backend.name().to_string(),
            on_update: None,
        };

        Self {
            config,
            backend,
            delivery,
            feedback,
            state: Arc::new(RwLock::new(OrchestratorState::new(Settings::default()))),
            batch_lock: Arc::new(Mutex::new(())),
            reset_task: Mutex::new(None),
            publisher,
        }
    }

    /// Uses `settings` instead of the defaults until they are changed.
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.state = Arc::new(RwLock::new(OrchestratorState::new(
            settings.with_fixed_layout(),
        )));
        self
    }

    /// Registers a callback receiving a snapshot after every state change.
    pub fn with_update_callback(mut self, callback: StateUpdateCallback) -> Self {
        self.publisher.on_update = Some(callback);
        self
    }

    /// Checks that the backend can convert and records the result.
    pub async fn initialize(&self) -> Result<(), OrchestratorError> {
        let validation = self.backend.validate().await;

        let mut state = self.state.write().await;
        let result = match validation {
            Ok(()) => {
                info!(backend = %self.publisher.backend, "Conversion backend ready");
                state.backend_ready = true;
                if state.batch == BatchState::Idle && state.queue.is_empty() {
                    state.status = StatusMessage::info(STATUS_READY);
                }
                Ok(())
            }
            Err(e) => {
                error!(backend = %self.publisher.backend, error = %e, "Conversion backend unavailable");
                state.backend_ready = false;
                state.status = StatusMessage::error(format!("{}: {}", STATUS_NOT_READY, e));
                Err(OrchestratorError::BackendUnavailable {
                    reason: e.to_string(),
                })
            }
        };
        self.publisher.publish(&state);
        result
    }

    /// Appends the audio files among `files` to the queue.
    ///
    /// While a batch runs the new files wait for the next one. After a
    /// completed batch the pending reset is applied first.
    pub async fn add(&self, files: Vec<FileRef>) -> Result<AddOutcome, OrchestratorError> {
        self.cancel_reset().await;

        let mut state = self.state.write().await;
        if state.batch == BatchState::Completed {
            state.reset_after_batch();
        }

        let outcome = match state.queue.add(files) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("No audio files among the selection");
                state.status = StatusMessage::warning(STATUS_NO_AUDIO);
                self.publisher.publish(&state);
                return Err(e.into());
            }
        };

        if state.batch != BatchState::Running {
            state.status = selected_status(outcome.total);
        }
        info!(
            accepted = outcome.accepted,
            rejected = outcome.rejected,
            total = outcome.total,
            "Files added to queue"
        );
        self.publisher.publish(&state);
        Ok(outcome)
    }

    /// Removes the queue entry at `index`.
    pub async fn remove(&self, index: usize) -> Result<QueuedFileSummary, OrchestratorError> {
        let mut state = self.state.write().await;
        if state.batch == BatchState::Running {
            return Err(OrchestratorError::QueueLocked);
        }

        let removed = state.queue.remove(index)?;
        state.batch_ids.retain(|id| *id != removed.id);
        state.status = if state.queue.is_empty() {
            StatusMessage::info(STATUS_NO_FILES)
        } else {
            selected_status(state.queue.len())
        };
        debug!(file = %removed.name(), index, "Removed file from queue");
        self.publisher.publish(&state);
        Ok(removed.summary())
    }

    /// Empties the queue and returns to Idle.
    pub async fn reset_queue(&self) -> Result<(), OrchestratorError> {
        self.cancel_reset().await;

        // Checked under the same guard as the mutation so a batch prepared
        // meanwhile keeps its queue.
        let mut state = self.state.write().await;
        if state.batch == BatchState::Running {
            return Err(OrchestratorError::QueueLocked);
        }
        state.queue.reset();
        state.reset_after_batch();
        state.status = StatusMessage::info(STATUS_READY);
        self.publisher.publish(&state);
        Ok(())
    }

    /// Replaces the settings used by the next batch.
    ///
    /// Sample rate and channel count are not configurable and are reset to
    /// the fixed values.
    pub async fn set_settings(&self, settings: Settings) -> Result<Settings, OrchestratorError> {
        let settings = settings.with_fixed_layout();
        if !is_valid_bitrate(&settings.bitrate) {
            return Err(OrchestratorError::InvalidSettings {
                reason: format!("bitrate {:?} must look like \"192k\"", settings.bitrate),
            });
        }

        let mut state = self.state.write().await;
        if state.batch == BatchState::Running {
            return Err(OrchestratorError::SettingsLocked);
        }
        state.settings = settings.clone();
        info!(codec = settings.codec.id(), bitrate = %settings.bitrate, "Settings updated");
        self.publisher.publish(&state);
        Ok(settings)
    }

    /// Checks the start conditions and moves to Running.
    ///
    /// Rejections leave the state untouched apart from a warning status.
    pub async fn prepare(&self) -> Result<PreparedBatch, OrchestratorError> {
        self.prepare_batch(false).await
    }

    /// Like [`prepare`](Self::prepare), clearing the retry offer first.
    pub async fn prepare_retry(&self) -> Result<PreparedBatch, OrchestratorError> {
        self.prepare_batch(true).await
    }

    async fn prepare_batch(&self, retry: bool) -> Result<PreparedBatch, OrchestratorError> {
        let guard = Arc::clone(&self.batch_lock)
            .try_lock_owned()
            .map_err(|_| {
                BATCHES_TOTAL.with_label_values(&["rejected"]).inc();
                OrchestratorError::AlreadyRunning
            })?;

        self.cancel_reset().await;

        let mut state = self.state.write().await;
        if retry {
            info!("Retrying conversion of the whole queue");
            state.show_retry = false;
        }

        if state.queue.is_empty() {
            warn!("Batch start rejected: queue is empty");
            BATCHES_TOTAL.with_label_values(&["rejected"]).inc();
            state.status = StatusMessage::warning(STATUS_EMPTY_BATCH);
            self.publisher.publish(&state);
            return Err(OrchestratorError::InvalidSelection {
                reason: STATUS_EMPTY_BATCH.to_string(),
            });
        }

        if !state.backend_ready {
            warn!(backend = %self.publisher.backend, "Batch start rejected: backend not ready");
            BATCHES_TOTAL.with_label_values(&["rejected"]).inc();
            state.status = StatusMessage::warning(STATUS_NOT_READY);
            self.publisher.publish(&state);
            return Err(OrchestratorError::BackendUnavailable {
                reason: STATUS_NOT_READY.to_string(),
            });
        }

        state.queue.mark_all_pending();
        let files: Vec<(u64, FileRef)> = state
            .queue
            .entries()
            .iter()
            .map(|entry| (entry.id, entry.file.clone()))
            .collect();

        state.batch = BatchState::Running;
        state.show_retry = false;
        state.files_completed = 0;
        state.deliveries.clear();
        state.batch_ids = files.iter().map(|(id, _)| *id).collect();
        state.progress = ProgressState {
            completed_count: 0,
            total_count: files.len(),
            percent: 0,
            showing: true,
        };
        state.generation += 1;

        info!(
            files = files.len(),
            codec = state.settings.codec.id(),
            bitrate = %state.settings.bitrate,
            backend = %self.publisher.backend,
            "Starting conversion batch"
        );
        self.publisher.publish(&state);

        Ok(PreparedBatch {
            files,
            settings: state.settings.clone(),
            generation: state.generation,
            guard,
        })
    }

    /// Converts and delivers every file of `batch` in order.
    ///
    /// Stops at the first failure, leaving the remaining files untouched.
    pub async fn run(&self, batch: PreparedBatch) -> Result<BatchSummary, OrchestratorError> {
        let PreparedBatch {
            files,
            settings,
            generation,
            guard,
        } = batch;
        let total = files.len();
        let format = settings.output_format();
        let started = Instant::now();
        let mut deliveries = Vec::with_capacity(total);

        for (i, (id, file)) in files.iter().enumerate() {
            {
                let mut state = self.state.write().await;
                state.progress.percent = state.progress.percent.max(percent_of(i, total));
                state.status = StatusMessage::info(format!("Converting: {}", file.name));
                state.queue.set_status(*id, FileStatus::Converting);
                self.publisher.publish(&state);
            }

            match self.process_file(file, &settings, &format).await {
                Ok(delivered) => {
                    let mut state = self.state.write().await;
                    state.files_completed += 1;
                    state.progress.completed_count = state.files_completed;
                    state.progress.percent = state.progress.percent.max(percent_of(i + 1, total));
                    state.queue.set_status(*id, FileStatus::Done);
                    state.deliveries.push(delivered.clone());
                    self.publisher.publish(&state);
                    deliveries.push(delivered);
                }
                Err(e) => return Err(self.fail(*id, e).await),
            }
        }

        {
            let mut state = self.state.write().await;
            state.batch = BatchState::Completed;
            state.progress.percent = 100;
            state.status =
                StatusMessage::success(format!("{} file(s) converted successfully!", total));
            self.publisher.publish(&state);
        }

        BATCHES_TOTAL.with_label_values(&["completed"]).inc();
        info!(
            files = total,
            duration_ms = started.elapsed().as_millis() as u64,
            "Conversion batch completed"
        );

        self.schedule_reset(generation).await;
        drop(guard);

        self.feedback.on_batch_success(total).await;

        Ok(BatchSummary {
            converted: total,
            deliveries,
        })
    }

    /// Runs a batch over the whole queue.
    pub async fn start(&self) -> Result<BatchSummary, OrchestratorError> {
        let batch = self.prepare().await?;
        self.run(batch).await
    }

    /// Clears the failure and runs the whole queue again.
    pub async fn retry(&self) -> Result<BatchSummary, OrchestratorError> {
        let batch = self.prepare_retry().await?;
        self.run(batch).await
    }

    /// Starts a batch in the background once the start checks passed.
    pub async fn launch(
        self: &Arc<Self>,
    ) -> Result<JoinHandle<Result<BatchSummary, OrchestratorError>>, OrchestratorError> {
        let batch = self.prepare().await?;
        let this = Arc::clone(self);
        Ok(tokio::spawn(async move { this.run(batch).await }))
    }

    /// Background variant of [`retry`](Self::retry).
    pub async fn launch_retry(
        self: &Arc<Self>,
    ) -> Result<JoinHandle<Result<BatchSummary, OrchestratorError>>, OrchestratorError> {
        let batch = self.prepare_retry().await?;
        let this = Arc::clone(self);
        Ok(tokio::spawn(async move { this.run(batch).await }))
    }

    /// Current published state.
    pub async fn snapshot(&self) -> OrchestratorSnapshot {
        let state = self.state.read().await;
        self.publisher.snapshot(&state)
    }

    /// Current batch state.
    pub async fn batch_state(&self) -> BatchState {
        self.state.read().await.batch
    }

    /// Settings the next batch will use.
    pub async fn settings(&self) -> Settings {
        self.state.read().await.settings.clone()
    }

    /// Whether [`initialize`](Self::initialize) found the backend usable.
    pub async fn is_backend_ready(&self) -> bool {
        self.state.read().await.backend_ready
    }

    /// Name of the configured backend.
    pub fn backend_name(&self) -> &str {
        &self.publisher.backend
    }

    /// Converts one file and delivers the result.
    async fn process_file(
        &self,
        file: &FileRef,
        settings: &Settings,
        format: &OutputFormat,
    ) -> Result<DeliveredFile, OrchestratorError> {
        let backend = self.publisher.backend.as_str();
        let job = ConversionJob {
            job_id: uuid::Uuid::new_v4().to_string(),
            file: file.clone(),
            settings: settings.clone(),
            output_name: derive_output_name(&file.name, settings),
        };
        debug!(job_id = %job.job_id, file = %file.name, output = %job.output_name, "Converting file");

        let started = Instant::now();
        let result = match self.backend.convert(job).await {
            Ok(result) => {
                CONVERSIONS_TOTAL.with_label_values(&[backend, "success"]).inc();
                CONVERSION_DURATION
                    .with_label_values(&[backend])
                    .observe(started.elapsed().as_secs_f64());
                result
            }
            Err(e) if e.is_unavailable() => {
                CONVERSIONS_TOTAL.with_label_values(&[backend, "unavailable"]).inc();
                return Err(OrchestratorError::BackendUnavailable {
                    reason: format!("Conversion of {} failed: {}", file.name, e),
                });
            }
            Err(e) => {
                CONVERSIONS_TOTAL.with_label_values(&[backend, "failed"]).inc();
                return Err(OrchestratorError::TranscodeFailure {
                    file: file.name.clone(),
                    source: e,
                });
            }
        };

        debug!(
            file = %file.name,
            payload = result.payload.kind(),
            duration_ms = result.duration_ms,
            "Conversion finished, delivering"
        );

        self.delivery
            .deliver(result, format)
            .await
            .map_err(|source| OrchestratorError::DeliveryFailure {
                file: file.name.clone(),
                source,
            })
    }

    /// Ends the running batch with `err` and offers a retry.
    async fn fail(&self, id: u64, err: OrchestratorError) -> OrchestratorError {
        let mut state = self.state.write().await;
        state.queue.set_status(id, FileStatus::Failed);
        state.batch = BatchState::FailedAwaitingRetry;
        state.show_retry = true;
        state.status = StatusMessage::error(format!("Conversion error: {}", err));

        BATCHES_TOTAL.with_label_values(&["failed"]).inc();
        error!(
            error = %err,
            files_completed = state.files_completed,
            total = state.progress.total_count,
            "Conversion batch aborted"
        );
        self.publisher.publish(&state);
        err
    }

    /// Schedules the return to Idle after the configured delay.
    async fn schedule_reset(&self, generation: u64) {
        let state = Arc::clone(&self.state);
        let publisher = self.publisher.clone();
        let delay = self.config.reset_delay();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut state = state.write().await;
            if state.batch != BatchState::Completed || state.generation != generation {
                debug!("Skipping stale reset");
                return;
            }
            state.reset_after_batch();
            debug!("Reset after completed batch");
            publisher.publish(&state);
        });

        if let Some(previous) = self.reset_task.lock().await.replace(handle) {
            previous.abort();
        }
    }

    /// Aborts a pending reset, if any.
    async fn cancel_reset(&self) {
        if let Some(handle) = self.reset_task.lock().await.take() {
            if !handle.is_finished() {
                debug!("Cancelling pending reset");
            }
            handle.abort();
        }
    }
}
