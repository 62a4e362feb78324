use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::errors::{ConfigError, Result};
use crate::notify::{Notification, Notifier, publish_best_effort};
use crate::parameters::ParameterStore;
use crate::source::{DeltaQuery, DeltaSource, SourceConnector};
use crate::staging::writer::write_delta_file;
use crate::staging::{ObjectStore, StagedArtifact, artifact_name};
use crate::telemetry::{StageMetrics, StageTimer};
use crate::watermark::{Advance, Watermark, next_watermark};

pub const WATERMARK_DESCRIPTION: &str = "Timestamp of the latest database sync";

/// Per-invocation input of the extract stage.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExtractRequest {
    pub mysql_database_name: String,
    pub table_users: String,
    pub table_accounts: String,
    pub s3_bucket_name: String,
}

impl ExtractRequest {
    /// Only the table names are spliced into SQL; the database name goes to
    /// the connect options untouched.
    pub fn delta_query(&self) -> Result<DeltaQuery> {
        for (field, value) in [
            ("mysql_database_name", &self.mysql_database_name),
            ("s3_bucket_name", &self.s3_bucket_name),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    field: field.to_string(),
                }
                .into());
            }
        }
        Ok(DeltaQuery::new(&self.table_users, &self.table_accounts)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractOutcome {
    Staged {
        artifact: StagedArtifact,
        rows: usize,
        previous_watermark: String,
        watermark: String,
        watermark_advanced: bool,
    },
    NoNewRows {
        watermark: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractReport {
    pub outcome: ExtractOutcome,
    pub metrics: StageMetrics,
}

/// Runs the extract stage: watermark read, delta query, staging, pointer
/// and watermark update.
///
/// Collaborators are borrowed so one set of clients serves every invocation
/// of a warm process.
pub struct Extractor<'a, P, O, N> {
    config: &'a SyncConfig,
    parameters: &'a P,
    storage: &'a O,
    notifier: &'a N,
}

impl<'a, P, O, N> Extractor<'a, P, O, N>
where
    P: ParameterStore,
    O: ObjectStore,
    N: Notifier,
{
    pub fn new(
        config: &'a SyncConfig,
        parameters: &'a P,
        storage: &'a O,
        notifier: &'a N,
    ) -> Self {
        Self {
            config,
            parameters,
            storage,
            notifier,
        }
    }

    /// Request validation and the watermark read happen before any
    /// notification is armed; their errors are returned as-is. Every later
    /// failure is published to the extraction topic once and then returned.
    pub async fn run<C: SourceConnector>(
        &self,
        request: &ExtractRequest,
        connector: &C,
    ) -> Result<ExtractReport> {
        let timer = StageTimer::start();
        let query = request.delta_query()?;
        let watermark = self.read_watermark().await?;
        info!(
            "Extracting {}/{} rows created after {}",
            query.users_table(),
            query.accounts_table(),
            watermark
        );

        let topic = &self.config.notifications.extraction_topic_arn;
        match self
            .sync_delta(connector, &query, &request.s3_bucket_name, &watermark)
            .await
        {
            Ok((outcome, metrics)) => {
                if let ExtractOutcome::NoNewRows { .. } = outcome {
                    info!("No new rows since {}", watermark);
                    publish_best_effort(self.notifier, topic, &Notification::no_new_rows()).await;
                }
                Ok(ExtractReport {
                    outcome,
                    metrics: timer.finish(metrics),
                })
            }
            Err(e) => {
                error!(
                    kind = e.stage_failure_kind().as_str(),
                    "Extraction failed: {}", e
                );
                publish_best_effort(self.notifier, topic, &Notification::extraction_failed(&e))
                    .await;
                Err(e)
            }
        }
    }

    async fn read_watermark(&self) -> Result<Watermark> {
        let name = &self.config.parameters.last_sync_timestamp;
        let raw = self.parameters.get(name).await?;
        Ok(Watermark::from_parameter(name, &raw)?)
    }

    /// Owns the source connection: it is closed on every path, and a close
    /// failure never replaces the stage result.
    async fn sync_delta<C: SourceConnector>(
        &self,
        connector: &C,
        query: &DeltaQuery,
        bucket: &str,
        since: &Watermark,
    ) -> Result<(ExtractOutcome, StageMetrics)> {
        let mut source = connector.connect().await?;
        let result = self.stage_delta(&mut source, query, bucket, since).await;

        if let Err(e) = source.close().await {
            warn!("Failed to close source connection: {}", e);
        }
        result
    }

    async fn stage_delta<S: DeltaSource>(
        &self,
        source: &mut S,
        query: &DeltaQuery,
        bucket: &str,
        since: &Watermark,
    ) -> Result<(ExtractOutcome, StageMetrics)> {
        let batch = source.fetch_delta(query, since).await?;
        if batch.is_empty() {
            return Ok((
                ExtractOutcome::NoNewRows {
                    watermark: since.to_parameter_value(),
                },
                StageMetrics::default(),
            ));
        }
        info!("Delta query returned {} rows", batch.len());

        let local_path = Path::new(&self.config.staging.local_path);
        let bytes_staged = write_delta_file(local_path, &batch)?;

        let key = artifact_name(&self.config.staging.artifact_prefix, Utc::now());
        self.storage.upload(local_path, bucket, &key).await?;

        let names = &self.config.parameters;
        self.parameters
            .put(&names.staged_filename, &key, None, true)
            .await?;

        let next = match next_watermark(since, batch.accounts_created()) {
            Advance::To(next) => {
                self.parameters
                    .put(
                        &names.last_sync_timestamp,
                        &next.to_parameter_value(),
                        Some(WATERMARK_DESCRIPTION),
                        true,
                    )
                    .await?;
                info!("Advanced watermark from {} to {}", since, next);
                Some(next)
            }
            Advance::NoAccountTimestamps => {
                warn!("Delta has no account timestamps; watermark stays at {}", since);
                None
            }
            Advance::NotNewer { candidate } => {
                warn!(
                    "Newest account timestamp {} is not after {}; watermark unchanged",
                    candidate, since
                );
                None
            }
        };

        let outcome = ExtractOutcome::Staged {
            artifact: StagedArtifact::new(bucket, key),
            rows: batch.len(),
            previous_watermark: since.to_parameter_value(),
            watermark: next.unwrap_or(*since).to_parameter_value(),
            watermark_advanced: next.is_some(),
        };
        let metrics = StageMetrics {
            rows_extracted: batch.len(),
            bytes_staged,
            ..Default::default()
        };
        Ok((outcome, metrics))
    }
}
