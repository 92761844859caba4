//! Sensorboard API Server
//!
//! Run with: cargo run --bin sensorboard
//!
//! # Configuration
//!
//! Read from `--config PATH`, else the first of
//! `$XDG_CONFIG_HOME/sensorboard/config.toml`, `/etc/sensorboard/config.toml`
//! and `./config.toml`. Environment variables override file values:
//! - `SENSORBOARD_DATA_DIR`
//! - `SENSORBOARD_API_HOST`, `SENSORBOARD_API_PORT`
//! - `SENSORBOARD_LOG_LEVEL`, `SENSORBOARD_LOG_FORMAT`
//! - `RUST_LOG`: takes precedence over the configured level

use clap::Parser;
use sensorboard::api::{serve, AppState};
use sensorboard::config::{generate_default_config, Config, LoggingConfig};
use sensorboard::storage::FileStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "sensorboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sensor reading aggregation server")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a default config file and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.print_config {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };

    init_tracing(&config.logging);

    tracing::info!("Starting Sensorboard v{}", env!("CARGO_PKG_VERSION"));

    let data_dir = config.storage.data_path();
    tracing::info!("Data directory: {:?}", data_dir);

    let store = Arc::new(FileStore::open(data_dir)?);

    let api_config = config.api_config();
    let state = AppState::with_ws_config(store, api_config.clone(), config.hub_config());

    let sensors = state.aggregator.read().await.len();
    tracing::info!(sensors, "Loaded persisted sensors");

    serve(state, &api_config).await?;

    tracing::info!("Sensorboard stopped");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "sensorboard={level},tower_http={level}",
            level = logging.level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
