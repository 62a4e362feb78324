use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Parameter store error: {0}")]
    Parameter(#[from] ParameterError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Staging error: {0}")]
    Storage(#[from] StorageError),

    #[error("Warehouse error: {0}")]
    Warehouse(#[from] WarehouseError),

    #[error("Notification error: {0}")]
    Notification(#[from] NotificationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Failed to load configuration from {path}: {error}")]
    LoadFailed {
        path: String,
        #[source]
        error: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Error, Debug)]
pub enum ParameterError {
    #[error("Parameter {name} not found")]
    NotFound { name: String },

    #[error("Failed to read parameter {name}: {reason}")]
    Read { name: String, reason: String },

    #[error("Failed to write parameter {name}: {reason}")]
    Write { name: String, reason: String },

    #[error("Parameter {name} has an invalid value: {reason}")]
    InvalidValue { name: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to connect to the source database: {source}")]
    Connection {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Delta query failed: {source}")]
    Query {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to decode column {column}: {reason}")]
    Decode { column: String, reason: String },

    #[error("Failed to close the source connection: {source}")]
    Close {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read staged file {path}: {reason}")]
    LocalFile { path: String, reason: String },

    #[error("Failed to upload object to s3://{bucket}/{key}: {reason}")]
    Upload {
        bucket: String,
        key: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("Failed to connect to the warehouse: {source}")]
    Connection {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Bulk load into {table} failed: {source}")]
    Load {
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to commit load into {table}: {source}")]
    Commit {
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Failed to close the warehouse connection: {source}")]
    Close {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Failed to publish to {topic}: {reason}")]
    Publish { topic: String, reason: String },
}

#[derive(Error, Debug)]
pub enum SerializationError {
    #[error("CSV serialization failed: {reason}")]
    Csv { reason: String },

    #[error("YAML serialization failed: {reason}")]
    Yaml { reason: String },
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl From<serde_yaml::Error> for SyncError {
    fn from(err: serde_yaml::Error) -> Self {
        SyncError::Serialization(SerializationError::Yaml {
            reason: err.to_string(),
        })
    }
}

impl From<csv::Error> for SyncError {
    fn from(err: csv::Error) -> Self {
        SyncError::Serialization(SerializationError::Csv {
            reason: err.to_string(),
        })
    }
}

/// Where a failed stage run sits in the failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Configuration or credential retrieval; raised before the protected block.
    Configuration,
    Connectivity,
    Execution,
    Transfer,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Configuration => "configuration",
            FailureKind::Connectivity => "connectivity",
            FailureKind::Execution => "execution",
            FailureKind::Transfer => "transfer",
        }
    }
}

impl SyncError {
    pub fn stage_failure_kind(&self) -> FailureKind {
        match self {
            SyncError::Config(_)
            | SyncError::Parameter(ParameterError::NotFound { .. })
            | SyncError::Parameter(ParameterError::Read { .. })
            | SyncError::Parameter(ParameterError::InvalidValue { .. }) => {
                FailureKind::Configuration
            }
            SyncError::Source(SourceError::Connection { .. })
            | SyncError::Warehouse(WarehouseError::Connection { .. }) => FailureKind::Connectivity,
            SyncError::Storage(_)
            | SyncError::Warehouse(WarehouseError::Load { .. })
            | SyncError::Warehouse(WarehouseError::Commit { .. }) => FailureKind::Transfer,
            _ => FailureKind::Execution,
        }
    }
}
