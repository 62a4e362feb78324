//! AWS-backed collaborators, built once per process and shared by every
//! stage invocation.

use aws_config::{BehaviorVersion, Region};

use crate::config::SyncConfig;
use crate::errors::Result;
use crate::extractor::{ExtractReport, ExtractRequest, Extractor};
use crate::loader::{LoadReport, LoadRequest, Loader};
use crate::notify::SnsNotifier;
use crate::parameters::{SsmParameterStore, load_source_credentials, load_warehouse_credentials};
use crate::sink::RedshiftConnector;
use crate::source::MySqlConnector;
use crate::staging::S3ObjectStore;

pub struct AwsServices {
    pub parameters: SsmParameterStore,
    pub storage: S3ObjectStore,
    pub notifier: SnsNotifier,
}

impl AwsServices {
    pub async fn from_config(config: &SyncConfig) -> Self {
        let mut aws_config_builder = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            aws_config_builder = aws_config_builder.region(Region::new(region.clone()));
        }
        let sdk_config = aws_config_builder.load().await;

        Self {
            parameters: SsmParameterStore::from_conf(&sdk_config),
            storage: S3ObjectStore::from_conf(&sdk_config, config.staging.endpoint_url.as_deref()),
            notifier: SnsNotifier::from_conf(&sdk_config),
        }
    }

    /// Source credentials are resolved first; a failure there is a
    /// configuration error and is not notified.
    pub async fn extract(&self, config: &SyncConfig, request: &ExtractRequest) -> Result<ExtractReport> {
        let credentials = load_source_credentials(&self.parameters, &config.parameters).await?;
        let connector = MySqlConnector::new(&credentials, &request.mysql_database_name);

        Extractor::new(config, &self.parameters, &self.storage, &self.notifier)
            .run(request, &connector)
            .await
    }

    pub async fn load(&self, config: &SyncConfig, request: &LoadRequest) -> Result<LoadReport> {
        let credentials = load_warehouse_credentials(&self.parameters, &config.parameters).await?;
        let connector = RedshiftConnector::new(&credentials, &config.warehouse.database);

        Loader::new(config, &self.parameters, &self.notifier)
            .run(request, &connector)
            .await
    }
}
