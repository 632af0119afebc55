//! Mock feedback service for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::feedback::FeedbackService;

/// Records the converted count of every successful batch.
#[derive(Debug, Default)]
pub struct MockFeedback {
    calls: Arc<RwLock<Vec<usize>>>,
}

impl MockFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converted counts passed to `on_batch_success`, in call order.
    pub async fn calls(&self) -> Vec<usize> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl FeedbackService for MockFeedback {
    fn name(&self) -> &str {
        "mock"
    }

    async fn on_batch_success(&self, converted: usize) {
        self.calls.write().await.push(converted);
    }
}
