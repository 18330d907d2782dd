//! pp-api - REST API service for the Przypis annotation backend

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use pp_api::{build_router, AppState};
use pp_common::config::Config;

#[derive(Parser, Debug)]
#[command(name = "pp-api", about = "Przypis annotation REST API")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, env = "PP_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting Przypis API (pp-api) v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let pool = pp_common::db::init_database(&config.database.path).await?;
    info!("✓ Connected to database: {}", config.database.path.display());

    // The sync service owner must exist before Demagog annotations show up in
    // API responses that join on users
    pp_common::db::ensure_system_user(&pool, &config.demagog.username).await?;

    let bind_addr = config.server.bind_addr.clone();
    let state = AppState::new(pool, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("pp-api listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
