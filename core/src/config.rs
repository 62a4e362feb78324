use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, Result};

/// Environment variable holding the inline YAML config when no path is given.
pub const CONFIG_ENV_VAR: &str = "CDC_SYNC_CONFIG";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub parameters: ParameterNames,
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub staging: StagingConfig,
    #[serde(default)]
    pub warehouse: WarehouseConfig,
}

/// Names of the secret-store entries the pipeline reads and writes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ParameterNames {
    pub last_sync_timestamp: String,
    pub staged_filename: String,
    pub source_user: String,
    pub source_password: String,
    pub source_host: String,
    pub source_port: Option<String>,
    pub warehouse_user: String,
    pub warehouse_password: String,
    pub warehouse_host: String,
    pub warehouse_port: String,
    pub iam_role: String,
}

impl Default for ParameterNames {
    fn default() -> Self {
        Self {
            last_sync_timestamp: "LastSyncTimestamp_accounts".to_string(),
            staged_filename: "raw_sync_query_filename".to_string(),
            source_user: "MySQLuser".to_string(),
            source_password: "MySQLpass".to_string(),
            source_host: "MySQLhost".to_string(),
            source_port: None,
            warehouse_user: "Redshiftuser".to_string(),
            warehouse_password: "Redshiftpass".to_string(),
            warehouse_host: "Redshifthost".to_string(),
            warehouse_port: "Redshiftport".to_string(),
            iam_role: "IAM_Role".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotificationConfig {
    pub extraction_topic_arn: String,
    pub load_topic_arn: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Local scratch file the delta is written to before upload.
    pub local_path: String,
    pub artifact_prefix: String,
    /// Override for S3-compatible stores (MinIO, LocalStack).
    pub endpoint_url: Option<String>,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            local_path: "/tmp/query_results.csv".to_string(),
            artifact_prefix: "mysql_latest_raw_query_".to_string(),
            endpoint_url: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WarehouseConfig {
    pub database: String,
    pub table: String,
    pub ignore_header_rows: u32,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            database: "data_platform".to_string(),
            table: "customer_io_user".to_string(),
            ignore_header_rows: 1,
        }
    }
}

pub async fn load_config(config_path: Option<&str>) -> Result<SyncConfig> {
    let config = match config_path {
        Some(path) => SyncConfig::from_file(path)?,
        None => SyncConfig::from_env()?,
    };
    config.validate()?;
    Ok(config)
}

impl SyncConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_string(),
            error: Box::new(e),
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_env() -> Result<Self> {
        let config_str = std::env::var(CONFIG_ENV_VAR).map_err(|_| ConfigError::MissingField {
            field: CONFIG_ENV_VAR.to_string(),
        })?;
        Self::from_yaml(&config_str)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: SyncConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.notifications.extraction_topic_arn.is_empty() {
            return Err(ConfigError::MissingField {
                field: "notifications.extraction_topic_arn".to_string(),
            }
            .into());
        }
        if self.notifications.load_topic_arn.is_empty() {
            return Err(ConfigError::MissingField {
                field: "notifications.load_topic_arn".to_string(),
            }
            .into());
        }
        if self.parameters.last_sync_timestamp.is_empty()
            || self.parameters.staged_filename.is_empty()
        {
            return Err(ConfigError::ValidationFailed {
                reason: "watermark and staged filename parameter names cannot be empty"
                    .to_string(),
            }
            .into());
        }
        if self.staging.local_path.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "staging.local_path cannot be empty".to_string(),
            }
            .into());
        }
        if self.warehouse.table.is_empty() || self.warehouse.database.is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "warehouse database and table cannot be empty".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
