use std::path::Path;

use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use tracing::info;

use crate::errors::{Result, StorageError};
use crate::staging::ObjectStore;

pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from the shared SDK config, optionally pointed at an
    /// S3-compatible endpoint (path-style addressing in that case).
    pub fn from_conf(sdk_config: &aws_config::SdkConfig, endpoint_url: Option<&str>) -> Self {
        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(sdk_config);

        if let Some(endpoint_url) = endpoint_url {
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint_url)
                .force_path_style(true);
        }

        Self::new(Client::from_conf(s3_config_builder.build()))
    }
}

impl ObjectStore for S3ObjectStore {
    async fn upload(&self, local_path: &Path, bucket: &str, key: &str) -> Result<()> {
        let body = ByteStream::from_path(local_path)
            .await
            .map_err(|e| StorageError::LocalFile {
                path: local_path.display().to_string(),
                reason: e.to_string(),
            })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("text/csv")
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::Upload {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: e.into_service_error().to_string(),
            })?;

        info!("Uploaded {} to s3://{}/{}", local_path.display(), bucket, key);
        Ok(())
    }
}
