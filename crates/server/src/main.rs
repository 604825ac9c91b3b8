//! petserver - user account service
//!
//! Registration, login and session issuance over HTTP.

mod app;

use anyhow::{Context, Result};
use clap::Parser;
use petserver_core::AppConfig;
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// CLI arguments for petserver
#[derive(Parser, Debug)]
#[command(name = "petserver")]
#[command(about = "User account service")]
#[command(version)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "petserver.toml")]
    pub config: PathBuf,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let (config, overrides) = AppConfig::load_with_env(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?;

    init_tracing(&config.log.level);

    if !overrides.is_empty() {
        info!("environment overrides: {}", overrides.join(", "));
    }

    if args.check_config {
        info!("configuration is valid");
        info!("  bind address: {}:{}", config.server.host, config.server.port);
        info!("  database: {}", config.database.path);
        info!("  session cache: {:?}", config.cache.backend);
        info!("  status policy: {:?}", config.api.status_policy);
        return Ok(());
    }

    info!("starting petserver v{}", env!("CARGO_PKG_VERSION"));

    let state = app::build_state(&config).await?;
    let router = api::router(state.clone());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Err(e) = state.auth_service.shutdown().await {
        warn!("failed to close session cache: {}", e);
    }
    info!("petserver stopped");

    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
