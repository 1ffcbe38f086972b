//! Rosterd Binary Entry Point
//!
//! Runs the employee roster HTTP API (`serve`) or the skill reverse-index
//! builder (`index`). Core functionality is provided by the `rosterd`
//! library crate.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use rosterd::{
    config::AppConfig,
    health::HealthMonitor,
    indexer::SkillIndexer,
    query::QueryService,
    server::{AppState, create_router},
    store::{RedisStore, Store},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Rosterd - Employee Roster Service
#[derive(Parser, Debug)]
#[command(name = "rosterd", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/rosterd.yaml",
        env = "ROSTERD_CONFIG"
    )]
    config: String,

    /// Server bind address (overrides config file)
    #[arg(long, env = "ROSTERD_SERVER_BIND")]
    server_bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "ROSTERD_SERVER_PORT")]
    server_port: Option<u16>,

    /// Store connection URL (overrides config file)
    #[arg(long, env = "ROSTERD_STORE_URL")]
    store_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API server
    Serve,

    /// Rebuild the skill reverse index, then exit
    Index {
        /// Fixed RNG seed for reproducible skill assignment
        #[arg(long)]
        seed: Option<u64>,

        /// Skip the read-back verification pass
        #[arg(long)]
        skip_verify: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rosterd=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration (file is optional; defaults apply without one)
    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::load_or_default(&cli.config)?;

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(bind) = cli.server_bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.server_port {
        config.server.port = port;
    }
    if let Some(url) = cli.store_url {
        config.store.url = url;
    }
    config.validate()?;

    // Connect the shared store client
    let redis = RedisStore::builder(config.store.url.as_str())
        .command_timeout(config.store.command_timeout)
        .max_retries(config.store.max_retries)
        .connect()
        .await?;
    let store = Store::new(redis);

    match cli.command {
        Command::Serve => serve(&config, store).await,
        Command::Index { seed, skip_verify } => {
            run_indexer(store, seed.or(config.indexer.seed), !skip_verify).await
        }
    }
}

/// Run the HTTP API server until shutdown.
async fn serve(config: &AppConfig, store: Store) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState {
        query: QueryService::new(store.clone()),
        health: HealthMonitor::new(store),
    };
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;

    tracing::info!("Web server listening on: http://{}", addr);
    tracing::info!("Press Ctrl+C to shutdown");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Run one skill index rebuild and log the outcome.
async fn run_indexer(
    store: Store,
    seed: Option<u64>,
    verify: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut indexer = SkillIndexer::new(store).with_verification(verify);
    if let Some(seed) = seed {
        tracing::info!(seed, "Using fixed skill-assignment seed");
        indexer = indexer.with_seed(seed);
    }

    let report = indexer.run().await?;
    tracing::info!(
        discovered = report.discovered,
        indexed = report.indexed,
        skipped = report.skipped.total(),
        "Index build finished"
    );
    Ok(())
}

/// Setup graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
