//! Completion feedback.
//!
//! After a batch succeeds the orchestrator calls
//! [`FeedbackService::on_batch_success`]. [`DesktopFeedback`] plays a short
//! ascending cue and shows a notification through external commands;
//! [`NoopFeedback`] does nothing.

mod config;
mod cue;
mod desktop;
mod traits;

pub use config::FeedbackConfig;
pub use cue::{render_wav, synthesize_cue, CUE_DURATION_SECS, CUE_SAMPLE_RATE};
pub use desktop::DesktopFeedback;
pub use traits::{notification_body, FeedbackService, NoopFeedback, NOTIFICATION_TITLE};

use std::sync::Arc;

/// Builds the configured feedback service.
pub fn create_feedback(config: &FeedbackConfig) -> Arc<dyn FeedbackService> {
    if config.enabled {
        Arc::new(DesktopFeedback::new(config.clone()))
    } else {
        Arc::new(NoopFeedback)
    }
}
