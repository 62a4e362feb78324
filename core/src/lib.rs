//! Incremental users/accounts change-data-capture.
//!
//! The extract stage stages every row created after the stored watermark as a
//! CSV object and advances the watermark; the load stage COPYs the staged
//! object into the warehouse. The stages share state only through the
//! parameter store (watermark and staged filename pointer).

pub mod config;
pub mod errors;
pub mod extractor;
pub mod loader;
pub mod notify;
pub mod parameters;
pub mod services;
pub mod sink;
pub mod source;
pub mod staging;
pub mod telemetry;
pub mod watermark;

pub use config::SyncConfig;
pub use errors::{Result, SyncError};
pub use extractor::{ExtractOutcome, ExtractReport, ExtractRequest, Extractor};
pub use loader::{LoadReport, LoadRequest, Loader};
pub use services::AwsServices;
pub use watermark::Watermark;
