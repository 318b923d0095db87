//! Vegetable Sales API (vegsales-api) - Main entry point
//!
//! Serves the bronze/silver/gold sales pipeline over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vegsales_common::config::{resolve_config, ConfigOverrides, StorageBackend};
use vegsales_common::store::open_store;

use vegsales_api::{build_info, build_router, AppState, Pipeline};

/// Command-line arguments for vegsales-api
#[derive(Parser, Debug)]
#[command(name = "vegsales-api")]
#[command(about = "Vegetable sales ingestion and monthly reporting service")]
#[command(version)]
struct Args {
    /// TOML configuration file (default: <config_dir>/vegsales/config.toml)
    #[arg(short, long, env = "VEGSALES_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "VEGSALES_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "VEGSALES_PORT")]
    port: Option<u16>,

    /// Storage backend: sqlite or csv
    #[arg(short, long, env = "VEGSALES_BACKEND")]
    backend: Option<String>,

    /// Folder holding the database file or CSV tables
    #[arg(short, long, env = "VEGSALES_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "VEGSALES_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> Result<ConfigOverrides> {
        let backend = self
            .backend
            .as_deref()
            .map(str::parse::<StorageBackend>)
            .transpose()
            .context("Invalid --backend")?;

        Ok(ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            backend,
            data_dir: self.data_dir.clone(),
            log_level: self.log_level.clone(),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = resolve_config(args.config.as_deref(), args.overrides()?)
        .context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    let level = &config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("vegsales_api={level},vegsales_common={level},tower_http={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let build = build_info();
    info!(
        "Starting vegsales-api v{} [{}] built {} ({})",
        build.version, build.git_hash, build.build_timestamp, build.profile
    );

    let data_dir = config.storage.resolved_data_dir();
    info!(
        "Storage: {} backend in {}",
        config.storage.backend,
        data_dir.display()
    );

    let store = open_store(&config.storage)
        .await
        .context("Failed to open sales store")?;
    let pipeline = Arc::new(Pipeline::new(store));

    let app = build_router(AppState::new(pipeline));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
