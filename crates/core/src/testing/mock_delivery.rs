//! Mock delivery channel for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::backend::{ConversionResult, Payload};
use crate::delivery::{mime_for_extension, extension_of, DeliveredFile, DeliveryChannel, DeliveryError};
use crate::settings::OutputFormat;

/// Mock implementation of the DeliveryChannel trait.
///
/// Records every delivered file in memory and can fail chosen names.
#[derive(Debug, Default)]
pub struct MockDelivery {
    delivered: Arc<RwLock<Vec<DeliveredFile>>>,
    /// Payloads as received, in delivery order.
    payloads: Arc<RwLock<Vec<Payload>>>,
    /// Failure reasons by output name.
    failures: Arc<RwLock<HashMap<String, String>>>,
}

impl MockDelivery {
    /// Create a new mock delivery channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all delivered files.
    pub async fn delivered(&self) -> Vec<DeliveredFile> {
        self.delivered.read().await.clone()
    }

    /// Get all received payloads.
    pub async fn payloads(&self) -> Vec<Payload> {
        self.payloads.read().await.clone()
    }

    /// Get the number of successful deliveries.
    pub async fn delivery_count(&self) -> usize {
        self.delivered.read().await.len()
    }

    /// Make the delivery of `output_name` fail with `reason`.
    pub async fn fail_on(&self, output_name: &str, reason: &str) {
        self.failures
            .write()
            .await
            .insert(output_name.to_string(), reason.to_string());
    }
}

#[async_trait]
impl DeliveryChannel for MockDelivery {
    fn name(&self) -> &str {
        "mock"
    }

    async fn deliver(
        &self,
        result: ConversionResult,
        format: &OutputFormat,
    ) -> Result<DeliveredFile, DeliveryError> {
        self.payloads.write().await.push(result.payload.clone());

        if let Some(reason) = self.failures.read().await.get(&result.output_name) {
            return Err(DeliveryError::DownloadFailed {
                reason: reason.clone(),
            });
        }

        let size_bytes = match &result.payload {
            Payload::Bytes(bytes) => bytes.len() as u64,
            Payload::Remote(_) => 0,
        };
        let delivered = DeliveredFile {
            path: PathBuf::from("/mock").join(&result.output_name),
            mime: extension_of(&result.output_name)
                .map(mime_for_extension)
                .unwrap_or(format.mime)
                .to_string(),
            name: result.output_name,
            size_bytes,
            delivered_at: Utc::now(),
        };
        self.delivered.write().await.push(delivered.clone());
        Ok(delivered)
    }
}
