//! Mock transcoding backend for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::backend::{ConversionJob, ConversionResult, Payload, TranscodeBackend, TranscodeError};

/// Mock implementation of the TranscodeBackend trait.
///
/// Provides controllable behavior for testing:
/// - Track conversion jobs for assertions
/// - Fail specific files with a service message
/// - Simulate an unavailable backend
/// - Simulate slow conversions
///
/// # Example
///
/// ```rust,ignore
/// use konverter_core::testing::MockBackend;
///
/// let backend = MockBackend::new();
/// backend.fail_on("b.wav", "unsupported").await;
///
/// // ... run a batch ...
///
/// assert_eq!(backend.convert_count().await, 2);
/// ```
#[derive(Debug)]
pub struct MockBackend {
    /// Recorded jobs in call order.
    jobs: Arc<RwLock<Vec<ConversionJob>>>,
    /// Service messages to fail with, by input file name.
    failures: Arc<RwLock<HashMap<String, String>>>,
    /// If set, the next conversion will fail with this error.
    next_error: Arc<RwLock<Option<TranscodeError>>>,
    /// Whether validation fails.
    unavailable: Arc<RwLock<bool>>,
    /// Whether to return remote locations instead of bytes.
    remote_payloads: Arc<RwLock<bool>>,
    /// Simulated conversion duration.
    delay: Arc<RwLock<Duration>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// Create a new mock backend.
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            next_error: Arc::new(RwLock::new(None)),
            unavailable: Arc::new(RwLock::new(false)),
            remote_payloads: Arc::new(RwLock::new(false)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get all recorded jobs.
    pub async fn recorded_jobs(&self) -> Vec<ConversionJob> {
        self.jobs.read().await.clone()
    }

    /// Get the number of conversions attempted.
    pub async fn convert_count(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Make every conversion of `file_name` fail with `message`.
    pub async fn fail_on(&self, file_name: &str, message: &str) {
        self.failures
            .write()
            .await
            .insert(file_name.to_string(), message.to_string());
    }

    /// Forget all configured per-file failures.
    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// Configure the next conversion to fail with the given error.
    pub async fn set_next_error(&self, error: TranscodeError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make validation and conversions report the backend as unavailable.
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    /// Return `/files/<name>` locations instead of bytes.
    pub async fn set_remote_payloads(&self, remote: bool) {
        *self.remote_payloads.write().await = remote;
    }

    /// Set the simulated conversion duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Highest number of conversions observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn outcome(&self, job: &ConversionJob) -> Result<Payload, TranscodeError> {
        if *self.unavailable.read().await {
            return Err(TranscodeError::not_ready("mock backend unavailable"));
        }
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if let Some(message) = self.failures.read().await.get(&job.file.name) {
            return Err(TranscodeError::Service {
                message: message.clone(),
            });
        }

        if *self.remote_payloads.read().await {
            Ok(Payload::Remote(format!("/files/{}", job.output_name)))
        } else {
            Ok(Payload::Bytes(
                format!("converted:{}", job.output_name).into_bytes(),
            ))
        }
    }
}

#[async_trait]
impl TranscodeBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        if *self.unavailable.read().await {
            return Err(TranscodeError::not_ready("mock backend unavailable"));
        }
        Ok(())
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, TranscodeError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.jobs.write().await.push(job.clone());

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.outcome(&job).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        Ok(ConversionResult {
            job_id: job.job_id,
            payload: outcome?,
            output_name: job.output_name,
            duration_ms: delay.as_millis() as u64,
        })
    }
}
