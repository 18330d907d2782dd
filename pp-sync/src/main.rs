//! pp-sync - Demagog publisher synchronization service

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use pp_common::config::Config;
use pp_sync::demagog::DemagogClient;
use pp_sync::sync::DemagogSync;

#[derive(Parser, Debug)]
#[command(name = "pp-sync", about = "Przypis Demagog fact-check sync")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, env = "PP_CONFIG")]
    config: Option<PathBuf>,

    /// Run a single sync pass and exit (for cron-style scheduling)
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Przypis Demagog sync (pp-sync) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let pool = pp_common::db::init_database(&config.database.path).await?;
    info!("✓ Connected to database: {}", config.database.path.display());

    let sync_user_guid =
        pp_common::db::ensure_system_user(&pool, &config.demagog.username).await?;

    let client = DemagogClient::new(&config.demagog.api_url)?;
    let sync = DemagogSync::new(pool, client, sync_user_guid);

    if args.once {
        sync.sync_all_statements().await?;
        return Ok(());
    }

    let interval_secs = config.demagog.sync_interval_secs;
    info!("Syncing every {} seconds", interval_secs);

    // First tick fires immediately, then every interval; one failed run must
    // never kill the loop
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    loop {
        interval.tick().await;
        if let Err(e) = sync.sync_all_statements().await {
            error!("Sync run failed: {}", e);
        }
    }
}
