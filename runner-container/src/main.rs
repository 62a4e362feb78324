use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sync_core::config::load_config;
use sync_core::telemetry::init_tracing;
use sync_core::{AwsServices, ExtractRequest, LoadRequest};
use tracing::info;

/// Runs one stage of the sync from a scheduler or a shell, outside of the
/// function runtime. The stage report is printed as JSON on stdout; a failed
/// stage exits non-zero after its notification has been sent.
#[derive(Parser)]
#[command(name = "cdc-sync", version, about = "Incremental users/accounts sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// YAML config file; falls back to the CDC_SYNC_CONFIG environment variable
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Stage rows created since the last watermark and advance it
    Extract {
        /// Source database name
        #[arg(long)]
        database: String,
        #[arg(long)]
        users_table: String,
        #[arg(long)]
        accounts_table: String,
        /// Staging bucket
        #[arg(long)]
        bucket: String,
    },
    /// COPY the most recently staged artifact into the warehouse
    Load {
        /// Staging bucket
        #[arg(long)]
        bucket: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())
        .await
        .context("Failed to load configuration")?;
    let services = AwsServices::from_config(&config).await;

    let report = match cli.command {
        Commands::Extract {
            database,
            users_table,
            accounts_table,
            bucket,
        } => {
            let request = ExtractRequest {
                mysql_database_name: database,
                table_users: users_table,
                table_accounts: accounts_table,
                s3_bucket_name: bucket,
            };
            let report = services
                .extract(&config, &request)
                .await
                .context("Extract stage failed")?;
            serde_json::to_string_pretty(&report)?
        }
        Commands::Load { bucket } => {
            let request = LoadRequest {
                s3_bucket_name: bucket,
            };
            let report = services
                .load(&config, &request)
                .await
                .context("Load stage failed")?;
            serde_json::to_string_pretty(&report)?
        }
    };

    info!("Stage completed");
    println!("{}", report);
    Ok(())
}
