//! Delivery of converted files.
//!
//! A [`DeliveryChannel`] receives each successful [`ConversionResult`] and
//! makes it available to the user under its derived name. [`DiskDelivery`]
//! saves into a directory, fetching remote payloads from the conversion
//! service first.
//!
//! [`ConversionResult`]: crate::backend::ConversionResult

mod config;
mod disk;
mod error;
mod resolve;
mod traits;
mod types;

pub use config::DeliveryConfig;
pub use disk::DiskDelivery;
pub use error::DeliveryError;
pub use resolve::{extension_of, mime_for_extension, resolve_location, FALLBACK_MIME};
pub use traits::DeliveryChannel;
pub use types::DeliveredFile;
