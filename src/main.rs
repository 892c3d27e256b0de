use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stockroom_api::config::{AppConfig, StoreBackend};
use stockroom_api::database::DatabaseManager;
use stockroom_api::{router, AppState};

#[derive(Parser, Debug)]
#[command(name = "stockroom-api", version, about = "Inventory tracking API server")]
struct Args {
    /// Port to listen on (overrides STOCKROOM_API_PORT / PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Keep all data in process memory instead of PostgreSQL
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("stockroom_api=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.api.port = port;
    }
    if args.memory {
        config.database.backend = StoreBackend::Memory;
    }
    config.validate().context("invalid configuration")?;

    tracing::info!(
        "Starting Stockroom API in {:?} mode with {:?} store",
        config.environment,
        config.database.backend
    );

    let store = DatabaseManager::open(&config.database)
        .await
        .context("failed to open inventory store")?;
    let state = AppState::new(store, &config);

    if let Some(account) = state
        .accounts
        .ensure_bootstrap_manager(&config.bootstrap)
        .await
        .context("failed to create bootstrap manager")?
    {
        tracing::info!("Created bootstrap manager '{}'", account.username);
    }

    let app = router(state, &config);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Stockroom API listening on http://{}", bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
