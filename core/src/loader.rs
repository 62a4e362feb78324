use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::errors::{ConfigError, Result};
use crate::notify::{Notification, Notifier, publish_best_effort};
use crate::parameters::ParameterStore;
use crate::sink::{CopyStatement, Warehouse, WarehouseConnector};
use crate::source::query::validate_identifier;
use crate::staging::StagedArtifact;
use crate::telemetry::{StageMetrics, StageTimer};

/// Per-invocation input of the load stage.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoadRequest {
    pub s3_bucket_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub artifact: StagedArtifact,
    pub table: String,
    pub metrics: StageMetrics,
}

/// Runs the load stage: one COPY of the artifact named by the staged
/// filename pointer.
///
/// There is no record of previously loaded artifacts, so running it twice
/// against the same pointer appends the rows twice.
pub struct Loader<'a, P, N> {
    config: &'a SyncConfig,
    parameters: &'a P,
    notifier: &'a N,
}

impl<'a, P, N> Loader<'a, P, N>
where
    P: ParameterStore,
    N: Notifier,
{
    pub fn new(config: &'a SyncConfig, parameters: &'a P, notifier: &'a N) -> Self {
        Self {
            config,
            parameters,
            notifier,
        }
    }

    /// Resolves the COPY statement from the parameter store, then loads it.
    /// Only failures from connecting onwards are published to the load topic.
    pub async fn run<W: WarehouseConnector>(
        &self,
        request: &LoadRequest,
        connector: &W,
    ) -> Result<LoadReport> {
        let timer = StageTimer::start();
        let (artifact, statement) = self.copy_statement(request).await?;
        info!("Loading {} into {}", statement.source_uri, statement.table);

        match self.load(connector, &statement).await {
            Ok(()) => Ok(LoadReport {
                artifact,
                table: statement.table,
                metrics: timer.finish(StageMetrics {
                    artifacts_loaded: 1,
                    ..Default::default()
                }),
            }),
            Err(e) => {
                error!(kind = e.stage_failure_kind().as_str(), "Load failed: {}", e);
                publish_best_effort(
                    self.notifier,
                    &self.config.notifications.load_topic_arn,
                    &Notification::load_failed(&e),
                )
                .await;
                Err(e)
            }
        }
    }

    async fn copy_statement(
        &self,
        request: &LoadRequest,
    ) -> Result<(StagedArtifact, CopyStatement)> {
        if request.s3_bucket_name.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "s3_bucket_name".to_string(),
            }
            .into());
        }
        let warehouse = &self.config.warehouse;
        validate_identifier("warehouse.table", &warehouse.table)?;

        let names = &self.config.parameters;
        let key = self.parameters.get(&names.staged_filename).await?;
        let iam_role = self.parameters.get(&names.iam_role).await?;
        let artifact = StagedArtifact::new(request.s3_bucket_name.clone(), key);

        let statement = CopyStatement {
            table: warehouse.table.clone(),
            source_uri: artifact.uri(),
            iam_role,
            ignore_header_rows: warehouse.ignore_header_rows,
        };
        Ok((artifact, statement))
    }

    /// Owns the warehouse session: closed on every path without masking the
    /// load result.
    async fn load<W: WarehouseConnector>(
        &self,
        connector: &W,
        statement: &CopyStatement,
    ) -> Result<()> {
        let mut session = connector.connect().await?;
        let result = session.bulk_load(statement).await;

        if let Err(e) = session.close().await {
            warn!("Failed to close warehouse connection: {}", e);
        }
        Ok(result?)
    }
}
