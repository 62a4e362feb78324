use lambda_runtime::{Error, LambdaEvent, service_fn};
use sync_core::config::load_config;
use sync_core::telemetry::init_tracing;
use sync_core::{AwsServices, ExtractReport, ExtractRequest, SyncConfig};
use tracing::info;

/// Invoked on a schedule with the source database, both table names and the
/// staging bucket. A failed run is returned as a function error so the
/// platform records it.
async fn extract_handler(
    config: &SyncConfig,
    services: &AwsServices,
    event: LambdaEvent<ExtractRequest>,
) -> Result<ExtractReport, Error> {
    let request = event.payload;
    let report = services.extract(config, &request).await?;
    info!(
        "Extraction finished in {:.2}s: {} rows, {} bytes staged",
        report.metrics.runtime_seconds, report.metrics.rows_extracted, report.metrics.bytes_staged
    );
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = load_config(None).await?;
    let services = AwsServices::from_config(&config).await;
    info!("Extract function initialised");

    let config = &config;
    let services = &services;
    lambda_runtime::run(service_fn(move |event: LambdaEvent<ExtractRequest>| async move {
        extract_handler(config, services, event).await
    }))
    .await
}
