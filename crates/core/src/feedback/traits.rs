//! Trait definitions for completion feedback.

use async_trait::async_trait;

/// Signals a successfully completed batch to the user.
///
/// Implementations are best-effort: they must never fail the batch, so
/// errors are handled internally and nothing is returned.
#[async_trait]
pub trait FeedbackService: Send + Sync {
    /// Returns the name of this feedback implementation.
    fn name(&self) -> &str;

    /// Plays the completion cue and shows a notification for `converted` files.
    async fn on_batch_success(&self, converted: usize);
}

/// Feedback that does nothing. Used headless and in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFeedback;

#[async_trait]
impl FeedbackService for NoopFeedback {
    fn name(&self) -> &str {
        "noop"
    }

    async fn on_batch_success(&self, _converted: usize) {}
}

/// Notification title shown after a successful batch.
pub const NOTIFICATION_TITLE: &str = "Conversion finished!";

/// Notification body for `converted` files.
pub fn notification_body(converted: usize) -> String {
    format!("{} file(s) converted successfully.", converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_feedback() {
        let feedback = NoopFeedback;
        feedback.on_batch_success(3).await;
        assert_eq!(feedback.name(), "noop");
    }

    #[test]
    fn test_notification_text() {
        assert_eq!(NOTIFICATION_TITLE, "Conversion finished!");
        assert_eq!(notification_body(2), "2 file(s) converted successfully.");
    }
}
