//! MALLOPS Server — application entry point.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mallops_db::DbManager;
use mallops_server::config::ServerConfig;
use mallops_server::state::AppState;
use tokio::signal::unix::{SignalKind, signal};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// MALLOPS mall-operations API server.
#[derive(Parser, Debug)]
#[command(name = "mallops-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Socket address to bind, overriding the config file.
    #[arg(long)]
    listen: Option<String>,

    /// Database endpoint, overriding the config file
    /// (e.g., `ws://127.0.0.1:8000` or `mem://`).
    #[arg(long)]
    db_endpoint: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("mallops={}", args.log_level).parse()?),
        )
        .json()
        .init();

    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(endpoint) = args.db_endpoint {
        config.database.endpoint = endpoint;
    }

    info!("Starting MALLOPS server...");

    let manager = DbManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    mallops_db::run_migrations(manager.client())
        .await
        .context("failed to run migrations")?;

    let state = AppState::new(manager.client().clone(), config.access_config());
    let app = mallops_server::router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;

    info!(addr = %config.listen, "MALLOPS server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("MALLOPS server stopped.");

    Ok(())
}

/// Resolves when SIGTERM or SIGINT arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, shutting down gracefully");
}
