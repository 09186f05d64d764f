//! tallyd - privacy-preserving page-view counter daemon

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tally_core::Anonymizer;
use tally_ledger::{CounterEngine, EngineConfig, RetentionPolicy, Store, Sweeper};
use tally_server::api::AppState;
use tally_server::config::Config;
use tally_server::{server, sweeper};

/// Tally - privacy-preserving page-view counter
#[derive(Parser)]
#[command(name = "tallyd")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listening port
    #[arg(long)]
    port: Option<u16>,

    /// Override the storage directory
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    // 1. Load and validate configuration
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.http.port = port;
    }
    if let Some(data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir;
    }
    config.validate()?;

    // 2. Open the counter database
    let store = Store::open(&config.storage.data_dir).with_context(|| {
        format!(
            "Failed to open database at {}",
            config.storage.data_dir.display()
        )
    })?;

    // 3. Build the counting engine
    let anonymizer = Anonymizer::new(&config.identity.salt);
    let engine = CounterEngine::new(
        &store,
        anonymizer,
        EngineConfig {
            debounce_window_ms: config.debounce_window_ms(),
        },
    )?;

    // 4. Start the background retention sweeper
    let retention = RetentionPolicy {
        horizon_ms: config.retention_horizon_ms(),
    };
    tokio::spawn(sweeper::run(
        Sweeper::new(engine.visit_ledger(), retention),
        Duration::from_secs(config.counting.sweep_interval_secs),
    ));

    // 5. Serve the API
    let state = Arc::new(AppState { engine });
    let router = server::router(state).layer(server::cors_layer(&config.http.allowed_origins)?);
    let addr = SocketAddr::new(config.http.host, config.http.port);
    server::serve(router, addr).await
}
