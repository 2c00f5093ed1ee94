//! refcat-web - reference catalog service
//!
//! Serves a Zotero library as filtered, paginated display resources and
//! exposes a poll endpoint for an external scheduler.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use refcat_common::config::{load_config, VersionStoreBackend, VersionStoreConfig};
use refcat_common::versions::{FileVersionStore, SqliteVersionStore, VersionStore};
use refcat_web::zotero::ZoteroClient;
use refcat_web::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for refcat-web
#[derive(Parser, Debug)]
#[command(name = "refcat-web")]
#[command(about = "Reference catalog web service")]
#[command(version)]
struct Args {
    /// Config file (defaults to ~/.config/refcat/config.toml)
    #[arg(short, long, env = "REFCAT_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overrides the config file
    #[arg(short, long, env = "REFCAT_BIND")]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", config.logging.level))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting refcat-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let credentials = config
        .zotero
        .credentials()
        .context("Zotero credentials are required")?;
    info!(
        library_type = %credentials.library_type,
        library_id = %credentials.library_id,
        "Using Zotero library"
    );

    let client = ZoteroClient::new(
        &credentials,
        &config.zotero.base_url,
        Duration::from_secs(config.zotero.timeout_secs),
    )
    .context("Failed to build Zotero client")?;

    let store = open_version_store(&config.version_store).await?;

    if config.cron_secret().is_none() {
        info!("No cron secret configured, /poll is unprotected");
    }
    if config.watched_collections.is_empty() {
        info!("No watched collections configured, /poll will check nothing");
    }

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(config, Arc::new(client), store);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    info!("refcat-web listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Open the configured version store backend
async fn open_version_store(config: &VersionStoreConfig) -> Result<Arc<dyn VersionStore>> {
    let path = config.resolved_path();
    let store: Arc<dyn VersionStore> = match config.backend {
        VersionStoreBackend::File => {
            info!("Version store: file {}", path.display());
            Arc::new(FileVersionStore::new(path))
        }
        VersionStoreBackend::Sqlite => {
            info!("Version store: sqlite {}", path.display());
            let store = SqliteVersionStore::open(&path)
                .await
                .with_context(|| format!("Failed to open version database {}", path.display()))?;
            Arc::new(store)
        }
    };
    Ok(store)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
