pub mod writer;
pub mod s3;

use std::future::Future;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::Result;

pub use s3::S3ObjectStore;

/// Timestamp layout embedded in artifact names. The slashes make each
/// day its own key "folder" in the bucket.
pub const ARTIFACT_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Object storage that the staged delta is uploaded to and the warehouse
/// reads from.
pub trait ObjectStore: Send + Sync {
    fn upload(
        &self,
        local_path: &Path,
        bucket: &str,
        key: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Builds the object key for an artifact uploaded at `at`.
///
/// Two uploads inside the same second produce the same key and the later
/// one overwrites the earlier.
pub fn artifact_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{}{}.csv", prefix, at.format(ARTIFACT_TIMESTAMP_FORMAT))
}

/// A delta file sitting in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagedArtifact {
    pub bucket: String,
    pub key: String,
}

impl StagedArtifact {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// URI form accepted by the warehouse bulk-load statement.
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}
