use lambda_runtime::{Error, LambdaEvent, service_fn};
use sync_core::config::load_config;
use sync_core::telemetry::init_tracing;
use sync_core::{AwsServices, LoadReport, LoadRequest, SyncConfig};
use tracing::info;

async fn load_handler(
    config: &SyncConfig,
    services: &AwsServices,
    event: LambdaEvent<LoadRequest>,
) -> Result<LoadReport, Error> {
    let report = services.load(config, &event.payload).await?;
    info!(
        "Loaded {} into {} in {:.2}s",
        report.artifact.uri(),
        report.table,
        report.metrics.runtime_seconds
    );
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = load_config(None).await?;
    let services = AwsServices::from_config(&config).await;
    info!("Load function initialised");

    let config = &config;
    let services = &services;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<LoadRequest>| async move {
        load_handler(config, services, event).await
    }))
    .await
}
