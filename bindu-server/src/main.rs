//! Bindu Server - REST API for the fingerprint capture bridge
//!
//! Exposes bindu-core over HTTP:
//! - POST /scanner/create-temp-folder - Provision a working folder
//! - POST /scanner/launch-sdk - Start the scanner SDK
//! - GET  /scanner/launch/{id} - Poll a launched SDK process
//! - POST /scanner/watch-fingerprint - Capture the scanner image for a user

use std::net::SocketAddr;
use std::sync::Arc;

use bindu_server::{create_router_with_state, db, AppState, Config, PgUserStore};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bindu_server=info,bindu_core=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env();

    let state = match &config.database_url {
        Some(url) => match db::connect(url, config.database_max_connections).await {
            Ok(pool) => {
                let store = PgUserStore::new(pool);
                if let Err(e) = store.migrate().await {
                    tracing::error!(error = %e, "Failed to migrate database");
                    std::process::exit(1);
                }
                tracing::info!("User store: Postgres");
                AppState::new(&config, Arc::new(store))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to database");
                std::process::exit(1);
            }
        },
        None => match AppState::in_memory(&config) {
            Ok(state) => {
                tracing::warn!("User store: in-memory (DATABASE_URL not set)");
                state
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load users file");
                std::process::exit(1);
            }
        },
    };

    let app = create_router_with_state(&config, state);
    let addr = config.socket_addr();

    tracing::info!(
        data_dir = %config.data_dir.display(),
        scanner_output = %config.scanner_output.display(),
        "Bindu server v{} listening on http://{}",
        env!("CARGO_PKG_VERSION"),
        addr
    );

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    {
        tracing::error!(error = %e, "Server error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    tracing::info!("Shutdown signal received");
}
