//! # RMS POS Server
//!
//! HTTP API for the point-of-sale system.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          RMS POS Server                                 │
//! │                                                                         │
//! │  POS Terminal ───► HTTP (8080) ───► Handlers ───► rms-db ───► SQLite  │
//! │                                         │                               │
//! │                                         ▼                               │
//! │                                  CheckoutService                        │
//! │                              (atomic transactions)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod routes;

use std::net::SocketAddr;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use rms_db::{CheckoutService, Database, DbConfig};

use crate::config::ServerConfig;

/// Shared application state. Cloning is cheap; both fields wrap a
/// reference-counted pool.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub checkout: CheckoutService,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; RUST_LOG controls the filter, e.g.
    // RUST_LOG=rms_server=debug,rms_db=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting RMS POS server...");

    // Load configuration
    let config = ServerConfig::load()?;
    info!(
        port = config.http_port,
        database = %config.database_path,
        policy = ?config.pricing_policy,
        "Configuration loaded"
    );

    // Connect to database (runs migrations)
    let db = Database::new(
        DbConfig::new(&config.database_path)
            .max_connections(config.db_max_connections)
            .busy_timeout(Duration::from_secs(config.db_busy_timeout_secs)),
    )
    .await?;
    info!("Database ready");

    let checkout = CheckoutService::new(db.clone(), config.pricing_policy);

    let state = AppState { db, checkout };
    let app = routes::router(state);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    info!(%addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
