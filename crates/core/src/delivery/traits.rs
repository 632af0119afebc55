//! Trait definitions for the delivery module.

use async_trait::async_trait;

use crate::backend::ConversionResult;
use crate::settings::OutputFormat;

use super::error::DeliveryError;
use super::types::DeliveredFile;

/// Hands a converted file to the user.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Returns the name of this delivery implementation.
    fn name(&self) -> &str;

    /// Delivers one converted file under `result.output_name`.
    async fn deliver(
        &self,
        result: ConversionResult,
        format: &OutputFormat,
    ) -> Result<DeliveredFile, DeliveryError>;
}
