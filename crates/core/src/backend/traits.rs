//! Trait definitions for the transcoding backends.

use async_trait::async_trait;

use super::error::TranscodeError;
use super::types::{ConversionJob, ConversionResult};

/// A backend that performs the byte-level conversion of one file.
///
/// Only the orchestrator calls [`convert`](TranscodeBackend::convert), and
/// never with more than one job in flight.
#[async_trait]
pub trait TranscodeBackend: Send + Sync {
    /// Returns the name of this backend implementation.
    fn name(&self) -> &str;

    /// Checks that the backend is configured and able to accept jobs.
    async fn validate(&self) -> Result<(), TranscodeError>;

    /// Converts one file according to the job settings.
    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, TranscodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Payload;
    use crate::queue::FileRef;
    use crate::settings::Settings;

    struct EchoBackend;

    #[async_trait]
    impl TranscodeBackend for EchoBackend {
        fn name(&self) -> &str {
            "echo"
        }

        async fn validate(&self) -> Result<(), TranscodeError> {
            Ok(())
        }

        async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, TranscodeError> {
            let bytes = job.file.source.read().await?;
            Ok(ConversionResult {
                job_id: job.job_id,
                payload: Payload::Bytes(bytes),
                output_name: job.output_name,
                duration_ms: 0,
            })
        }
    }

    #[tokio::test]
    async fn test_backend_as_trait_object() {
        let backend: Box<dyn TranscodeBackend> = Box::new(EchoBackend);
        assert_eq!(backend.name(), "echo");
        assert!(backend.validate().await.is_ok());

        let job = ConversionJob {
            job_id: "job-1".to_string(),
            file: FileRef::from_bytes("a.wav", None, vec![9, 9]),
            settings: Settings::default(),
            output_name: "a.mp3".to_string(),
        };
        let result = backend.convert(job).await.unwrap();
        assert_eq!(result.job_id, "job-1");
        assert_eq!(result.output_name, "a.mp3");
        assert_eq!(result.payload, Payload::Bytes(vec![9, 9]));
    }
}
