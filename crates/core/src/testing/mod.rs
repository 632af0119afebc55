//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the orchestrator's
//! collaborators, so whole batches can be driven without ffmpeg, a network
//! or a desktop session.
//!
//! # Example
//!
//! ```rust,ignore
//! use konverter_core::testing::{fixtures, MockBackend, MockDelivery, MockFeedback};
//!
//! let backend = Arc::new(MockBackend::new());
//! let delivery = Arc::new(MockDelivery::new());
//! let feedback = Arc::new(MockFeedback::new());
//! let orchestrator = fixtures::orchestrator(backend.clone(), delivery.clone(), feedback.clone(), 50);
//!
//! orchestrator.initialize().await?;
//! orchestrator.add(vec![fixtures::audio_file("a.mp3")]).await?;
//! orchestrator.start().await?;
//! ```

mod mock_backend;
mod mock_delivery;
mod mock_feedback;

pub use mock_backend::MockBackend;
pub use mock_delivery::MockDelivery;
pub use mock_feedback::MockFeedback;

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::sync::Arc;

    use super::{MockBackend, MockDelivery, MockFeedback};
    use crate::orchestrator::{ConversionOrchestrator, OrchestratorConfig};
    use crate::queue::FileRef;

    /// Bytes of a minimal (header-only) WAV file.
    pub const WAV_HEADER: &[u8] = b"RIFF\x24\x00\x00\x00WAVEfmt ";

    /// Create an in-memory audio file recognised by its extension.
    pub fn audio_file(name: &str) -> FileRef {
        FileRef::from_bytes(name, None, WAV_HEADER.to_vec())
    }

    /// Create an in-memory file with a declared audio media type.
    pub fn typed_audio_file(name: &str, media_type: &str) -> FileRef {
        FileRef::from_bytes(name, Some(media_type.to_string()), WAV_HEADER.to_vec())
    }

    /// Create an in-memory file that is not audio.
    pub fn text_file(name: &str) -> FileRef {
        FileRef::from_bytes(name, Some("text/plain".to_string()), b"hello".to_vec())
    }

    /// Create an orchestrator wired to the given mocks.
    pub fn orchestrator(
        backend: Arc<MockBackend>,
        delivery: Arc<MockDelivery>,
        feedback: Arc<MockFeedback>,
        reset_delay_ms: u64,
    ) -> ConversionOrchestrator {
        ConversionOrchestrator::new(
            OrchestratorConfig::with_reset_delay_ms(reset_delay_ms),
            backend,
            delivery,
            feedback,
        )
    }
}
