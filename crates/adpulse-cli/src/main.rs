mod ingest;
mod seed;
mod tag;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "adpulse-cli")]
#[command(about = "AdPulse command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sync the advertiser registry from config/advertisers.yaml
    Seed,
    /// Run an ingest cycle for every active advertiser
    Ingest {
        /// Restrict the cycle to a specific advertiser (by slug)
        #[arg(long)]
        advertiser: Option<String>,

        /// How many advertisers to ingest concurrently
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Classify untagged creatives along the five tag axes
    Tag {
        /// Maximum number of ads to tag in one pass
        #[arg(long)]
        limit: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = adpulse_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = adpulse_db::PoolConfig::from_app_config(&config);
    let pool = adpulse_db::connect_pool(&config.database_url, pool_config).await?;
    adpulse_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Seed => seed::run_seed(&pool, &config).await,
        Commands::Ingest {
            advertiser,
            concurrency,
        } => ingest::run_ingest(&pool, &config, advertiser.as_deref(), concurrency).await,
        Commands::Tag { limit } => tag::run_tag(&pool, &config, limit).await,
    }
}
