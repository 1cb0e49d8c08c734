use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stash_core::config::resolve_access_codes;
use stash_core::{CoreConfig, DEFAULT_CONFIG_FILE, DEFAULT_LISTEN_ADDR, DEFAULT_STORAGE_DIR};

/// Main entry point for the Stash file server
///
/// Resolves configuration once, then serves the REST API until Ctrl-C or SIGTERM.
/// Access codes are fixed for the lifetime of the process; restart to pick up changes.
///
/// # Environment Variables
/// - `STASH_ADDR`: listen address (default: "0.0.0.0:3456")
/// - `STASH_STORAGE_DIR`: storage root (default: "files")
/// - `STASH_CONFIG_FILE`: line-based config file with `accessCodes=A,B` (default: "env.conf")
/// - `STASH_ACCESS_CODES`: comma-separated access codes, overrides the config file
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - no valid access codes can be resolved,
/// - the storage root cannot be created,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("stash_run=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr: SocketAddr = std::env::var("STASH_ADDR")
        .unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.into())
        .parse()?;
    let storage_root =
        PathBuf::from(std::env::var("STASH_STORAGE_DIR").unwrap_or_else(|_| DEFAULT_STORAGE_DIR.into()));
    let config_file =
        PathBuf::from(std::env::var("STASH_CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into()));

    let access_codes = resolve_access_codes(std::env::var("STASH_ACCESS_CODES").ok(), &config_file)?;

    let cfg = Arc::new(CoreConfig::new(storage_root, access_codes)?);
    cfg.ensure_storage_root()?;

    tracing::info!(
        "++ Loaded {} access code(s), storing under {}",
        cfg.access_codes().len(),
        cfg.storage_root().display()
    );
    tracing::info!("++ Starting Stash REST on http://{}", addr);

    let app = api_rest::router(cfg);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("-- Stash REST stopped");
    Ok(())
}

/// Resolves when the process receives Ctrl-C or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Received termination signal, shutting down");
}
