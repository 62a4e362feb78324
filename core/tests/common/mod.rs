#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use sync_core::SyncConfig;
use sync_core::errors::{
    NotificationError, ParameterError, Result, SourceError, StorageError, WarehouseError,
};
use sync_core::notify::Notifier;
use sync_core::parameters::ParameterStore;
use sync_core::sink::{CopyStatement, Warehouse, WarehouseConnector};
use sync_core::source::{Cell, DeltaBatch, DeltaQuery, DeltaRow, DeltaSource, SourceConnector};
use sync_core::staging::ObjectStore;
use sync_core::watermark::Watermark;

pub const EXTRACT_TOPIC: &str = "arn:aws:sns:eu-west-1:123456789012:MYSQL_Extraction";
pub const LOAD_TOPIC: &str = "arn:aws:sns:eu-west-1:123456789012:REDSHIFT_UPLOAD";
pub const BUCKET: &str = "raw-sync";

/// Every externally visible effect, in the order the stages caused it.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Put {
        name: String,
        value: String,
        description: Option<String>,
    },
    Upload {
        bucket: String,
        key: String,
    },
    Publish {
        topic: String,
        subject: String,
        message: String,
    },
    SourceConnect,
    SourceClose,
    WarehouseConnect,
    BulkLoad(String),
    WarehouseClose,
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    pub fn record(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn publishes(&self) -> Vec<(String, String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Publish {
                    topic,
                    subject,
                    message,
                } => Some((topic, subject, message)),
                _ => None,
            })
            .collect()
    }

    pub fn puts_to(&self, name: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Put { name: n, value, .. } if n == name => Some(value),
                _ => None,
            })
            .collect()
    }

    pub fn position(&self, predicate: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls().iter().position(predicate)
    }
}

pub fn test_config(staging_dir: &Path) -> SyncConfig {
    let yaml = format!(
        r#"
notifications:
  extraction_topic_arn: "{EXTRACT_TOPIC}"
  load_topic_arn: "{LOAD_TOPIC}"
staging:
  local_path: "{}"
warehouse:
  ignore_header_rows: 0
"#,
        staging_dir.join("query_results.csv").display()
    );
    let config = SyncConfig::from_yaml(&yaml).unwrap();
    config.validate().unwrap();
    config
}

pub fn ts(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S").unwrap()
}

/// A joined row: `id`, `email`, then the account columns and both
/// creation timestamps.
pub fn joined_row(id: i64, users_created: Option<&str>, accounts_created: Option<&str>) -> DeltaRow {
    let stamp = |value: Option<&str>| value.map(|v| Cell::DateTime(ts(v))).unwrap_or(Cell::Null);
    let cells = vec![
        Cell::Int(id),
        Cell::Text(format!("user{id}@example.com")),
        if accounts_created.is_some() {
            Cell::Int(id)
        } else {
            Cell::Null
        },
        stamp(users_created),
        stamp(accounts_created),
    ];
    DeltaRow::from_cells(cells).unwrap()
}

pub fn batch(rows: Vec<DeltaRow>) -> DeltaBatch {
    DeltaBatch { rows }
}

pub struct MemoryParameterStore {
    values: Mutex<HashMap<String, String>>,
    journal: Journal,
}

impl MemoryParameterStore {
    pub fn new(journal: Journal) -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            journal,
        }
    }

    pub fn with(self, name: &str, value: &str) -> Self {
        self.values
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn value(&self, name: &str) -> Option<String> {
        self.values.lock().unwrap().get(name).cloned()
    }
}

impl ParameterStore for MemoryParameterStore {
    async fn get(&self, name: &str) -> Result<String> {
        self.value(name).ok_or_else(|| {
            ParameterError::NotFound {
                name: name.to_string(),
            }
            .into()
        })
    }

    async fn put(
        &self,
        name: &str,
        value: &str,
        description: Option<&str>,
        overwrite: bool,
    ) -> Result<()> {
        let mut values = self.values.lock().unwrap();
        if !overwrite && values.contains_key(name) {
            return Err(ParameterError::Write {
                name: name.to_string(),
                reason: "parameter already exists".to_string(),
            }
            .into());
        }
        values.insert(name.to_string(), value.to_string());
        self.journal.record(Call::Put {
            name: name.to_string(),
            value: value.to_string(),
            description: description.map(str::to_string),
        });
        Ok(())
    }
}

/// Keeps uploaded bytes keyed by `bucket/key`, read from the local file at
/// upload time.
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    reject_uploads: Option<String>,
    journal: Journal,
}

impl MemoryObjectStore {
    pub fn new(journal: Journal) -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            reject_uploads: None,
            journal,
        }
    }

    pub fn rejecting(journal: Journal, reason: &str) -> Self {
        Self {
            reject_uploads: Some(reason.to_string()),
            ..Self::new(journal)
        }
    }

    pub fn insert(&self, bucket: &str, key: &str, body: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(format!("{bucket}/{key}"), body.to_vec());
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(&format!("{bucket}/{key}")).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }
}

impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, local_path: &Path, bucket: &str, key: &str) -> Result<()> {
        if let Some(reason) = &self.reject_uploads {
            return Err(StorageError::Upload {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: reason.clone(),
            }
            .into());
        }
        let body = std::fs::read(local_path).map_err(|e| StorageError::LocalFile {
            path: local_path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.insert(bucket, key, &body);
        self.journal.record(Call::Upload {
            bucket: bucket.to_string(),
            key: key.to_string(),
        });
        Ok(())
    }
}

pub struct RecordingNotifier {
    unavailable: bool,
    journal: Journal,
}

impl RecordingNotifier {
    pub fn new(journal: Journal) -> Self {
        Self {
            unavailable: false,
            journal,
        }
    }

    pub fn unavailable(journal: Journal) -> Self {
        Self {
            unavailable: true,
            journal,
        }
    }
}

impl Notifier for RecordingNotifier {
    async fn publish(&self, topic: &str, subject: &str, message: &str) -> Result<()> {
        self.journal.record(Call::Publish {
            topic: topic.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
        });
        if self.unavailable {
            return Err(NotificationError::Publish {
                topic: topic.to_string(),
                reason: "endpoint unreachable".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Hands out sources that answer the delta query with a fixed result.
pub struct ScriptedConnector {
    result: std::result::Result<DeltaBatch, String>,
    refuse: Option<String>,
    close_error: Option<String>,
    queried_since: Arc<Mutex<Vec<Watermark>>>,
    journal: Journal,
}

impl ScriptedConnector {
    pub fn returning(journal: Journal, batch: DeltaBatch) -> Self {
        Self {
            result: Ok(batch),
            refuse: None,
            close_error: None,
            queried_since: Arc::default(),
            journal,
        }
    }

    pub fn failing_query(journal: Journal, message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            ..Self::returning(journal, DeltaBatch::default())
        }
    }

    pub fn refusing(journal: Journal, message: &str) -> Self {
        Self {
            refuse: Some(message.to_string()),
            ..Self::returning(journal, DeltaBatch::default())
        }
    }

    /// Sources handed out by this connector fail to close.
    pub fn with_close_error(mut self, message: &str) -> Self {
        self.close_error = Some(message.to_string());
        self
    }

    pub fn queried_since(&self) -> Vec<Watermark> {
        self.queried_since.lock().unwrap().clone()
    }
}

pub struct ScriptedSource {
    result: std::result::Result<DeltaBatch, String>,
    close_error: Option<String>,
    queried_since: Arc<Mutex<Vec<Watermark>>>,
    journal: Journal,
}

impl SourceConnector for ScriptedConnector {
    type Source = ScriptedSource;

    async fn connect(&self) -> std::result::Result<ScriptedSource, SourceError> {
        if let Some(message) = &self.refuse {
            return Err(SourceError::Connection {
                source: message.clone().into(),
            });
        }
        self.journal.record(Call::SourceConnect);
        Ok(ScriptedSource {
            result: self.result.clone(),
            close_error: self.close_error.clone(),
            queried_since: Arc::clone(&self.queried_since),
            journal: self.journal.clone(),
        })
    }
}

impl DeltaSource for ScriptedSource {
    async fn fetch_delta(
        &mut self,
        _query: &DeltaQuery,
        since: &Watermark,
    ) -> std::result::Result<DeltaBatch, SourceError> {
        self.queried_since.lock().unwrap().push(*since);
        self.result.clone().map_err(|message| SourceError::Query {
            source: message.into(),
        })
    }

    async fn close(self) -> std::result::Result<(), SourceError> {
        self.journal.record(Call::SourceClose);
        match self.close_error {
            Some(message) => Err(SourceError::Close {
                source: message.into(),
            }),
            None => Ok(()),
        }
    }
}

/// A warehouse table fed by COPY statements that read staged objects from a
/// [`MemoryObjectStore`].
pub struct MemoryWarehouse {
    storage: Arc<MemoryObjectStore>,
    tables: Arc<Mutex<HashMap<String, Vec<Vec<String>>>>>,
    fail_load: Option<String>,
    refuse: Option<String>,
    close_error: Option<String>,
    journal: Journal,
}

impl MemoryWarehouse {
    pub fn new(journal: Journal, storage: Arc<MemoryObjectStore>) -> Self {
        Self {
            storage,
            tables: Arc::default(),
            fail_load: None,
            refuse: None,
            close_error: None,
            journal,
        }
    }

    pub fn refusing(journal: Journal, storage: Arc<MemoryObjectStore>, message: &str) -> Self {
        Self {
            refuse: Some(message.to_string()),
            ..Self::new(journal, storage)
        }
    }

    /// Sessions opened by this warehouse fail to close.
    pub fn with_close_error(mut self, message: &str) -> Self {
        self.close_error = Some(message.to_string());
        self
    }

    pub fn failing(journal: Journal, storage: Arc<MemoryObjectStore>, message: &str) -> Self {
        Self {
            fail_load: Some(message.to_string()),
            ..Self::new(journal, storage)
        }
    }

    pub fn rows(&self, table: &str) -> Vec<Vec<String>> {
        self.tables.lock().unwrap().get(table).cloned().unwrap_or_default()
    }
}

pub struct MemorySession {
    storage: Arc<MemoryObjectStore>,
    tables: Arc<Mutex<HashMap<String, Vec<Vec<String>>>>>,
    fail_load: Option<String>,
    close_error: Option<String>,
    journal: Journal,
}

impl WarehouseConnector for MemoryWarehouse {
    type Session = MemorySession;

    async fn connect(&self) -> std::result::Result<MemorySession, WarehouseError> {
        if let Some(message) = &self.refuse {
            return Err(WarehouseError::Connection {
                source: message.clone().into(),
            });
        }
        self.journal.record(Call::WarehouseConnect);
        Ok(MemorySession {
            storage: Arc::clone(&self.storage),
            tables: Arc::clone(&self.tables),
            fail_load: self.fail_load.clone(),
            close_error: self.close_error.clone(),
            journal: self.journal.clone(),
        })
    }
}

impl MemorySession {
    fn read_staged(&self, statement: &CopyStatement) -> std::result::Result<Vec<Vec<String>>, String> {
        let location = statement
            .source_uri
            .strip_prefix("s3://")
            .ok_or_else(|| format!("unsupported location {}", statement.source_uri))?;
        let (bucket, key) = location
            .split_once('/')
            .ok_or_else(|| format!("no key in {}", statement.source_uri))?;
        let body = self
            .storage
            .object(bucket, key)
            .ok_or_else(|| format!("The specified key does not exist: {key}"))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(body.as_slice());
        let mut rows = Vec::new();
        for record in reader.records().skip(statement.ignore_header_rows as usize) {
            let record = record.map_err(|e| e.to_string())?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(rows)
    }
}

impl Warehouse for MemorySession {
    async fn bulk_load(&mut self, statement: &CopyStatement) -> std::result::Result<(), WarehouseError> {
        self.journal.record(Call::BulkLoad(statement.to_string()));
        let load_error = |message: String| WarehouseError::Load {
            table: statement.table.clone(),
            source: message.into(),
        };
        if let Some(message) = &self.fail_load {
            return Err(load_error(message.clone()));
        }
        let rows = self.read_staged(statement).map_err(load_error)?;
        self.tables
            .lock()
            .unwrap()
            .entry(statement.table.clone())
            .or_default()
            .extend(rows);
        Ok(())
    }

    async fn close(self) -> std::result::Result<(), WarehouseError> {
        self.journal.record(Call::WarehouseClose);
        match self.close_error {
            Some(message) => Err(WarehouseError::Close {
                source: message.into(),
            }),
            None => Ok(()),
        }
    }
}

pub fn staging_dir() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_path_buf();
    (dir, path)
}
