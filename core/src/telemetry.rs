use std::time::Instant;

use serde::Serialize;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sync_core=info,extract=info,load=info,cdc_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct StageMetrics {
    pub rows_extracted: usize,
    pub bytes_staged: u64,
    pub artifacts_loaded: usize,
    pub runtime_seconds: f64,
}

/// Tracks elapsed time for one stage run.
pub struct StageTimer {
    started: Instant,
}

impl StageTimer {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    pub fn finish(&self, mut metrics: StageMetrics) -> StageMetrics {
        metrics.runtime_seconds = self.started.elapsed().as_secs_f64();
        metrics
    }
}
