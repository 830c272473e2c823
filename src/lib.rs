//! # Shortener
//!
//! A URL shortening service:
//!
//! - **Shortening**: single URLs (plain text or JSON) and ordered batches
//! - **Redirects**: `GET /{id}` answers 307, or 410 once the link is deleted
//! - **Ownership**: users are identified by a signed `AuthToken` cookie and can
//!   list or soft-delete their links
//! - **Storage**: `PostgreSQL`, an append-only JSON-lines file, or memory,
//!   chosen at startup
//! - **gRPC**: the same operations over `tonic`, next to the HTTP server
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                          Shortener Service                           │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────┐  ┌────────────┐ │
//! │  │   API Layer │  │   Service   │  │   Storage   │  │  Domain    │ │
//! │  │  (Axum)     │→ │   Layer     │→ │   Layer     │  │  Models    │ │
//! │  └─────────────┘  └─────────────┘  └─────────────┘  └────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod grpc;
pub mod service;
pub mod storage;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum_server::{Handle, tls_rustls::RustlsConfig};
use tokio::net::{TcpListener, lookup_host};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::api::create_router;
use crate::api::state::AppState;
use crate::config::{AppConfig, ServerConfig};
use crate::grpc::UrlShortenerService;
use crate::service::NanoIdGenerator;
use crate::storage::create_storage;
use crate::storage::traits::Storage;

/// How long in-flight HTTPS connections get to finish after a shutdown signal.
const HTTPS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the shortener service.
///
/// This function:
/// 1. Loads configuration from flags, environment and an optional JSON file
/// 2. Initializes the storage backend
/// 3. Creates all services
/// 4. Starts the HTTP (or HTTPS) server and the gRPC mirror
/// 5. Handles graceful shutdown and closes storage
///
/// Storage is closed on every exit path once it has been opened, including
/// when a server fails to start.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration cannot be loaded
/// - The cookie secret is unusable
/// - A server fails to bind or the TLS files cannot be read
pub async fn run() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging
    init_logging(&config);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting shortener");

    if config.auth.uses_default_secret() {
        warn!("Using the built-in cookie secret, set COOKIE_SECRET in production");
    }

    // Initialize storage
    let storage = create_storage(&config.storage, Arc::new(NanoIdGenerator::default())).await;
    info!(backend = storage.backend_name(), "Storage initialized");

    let served = serve(&config, Arc::clone(&storage)).await;

    let closed = storage.close().await;
    if let Err(e) = &closed {
        error!(error = %e, "Failed to close storage");
    }

    served?;
    closed?;
    info!("Server shutdown complete");
    Ok(())
}

/// Build the services and serve until shutdown or the first server failure.
async fn serve(config: &AppConfig, storage: Arc<dyn Storage>) -> anyhow::Result<()> {
    let state = AppState::new(Arc::new(config.clone()), storage)?;

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    let grpc_task = config.server.grpc_address.clone().map(|address| {
        let service = UrlShortenerService::from_state(&state);
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let result = grpc::serve(&address, service, shutdown.clone()).await;
            if result.is_err() {
                shutdown.cancel();
            }
            result
        })
    });

    let app = create_router(state);
    let served = if config.server.enable_https {
        serve_https(&config.server, app, shutdown.clone()).await
    } else {
        serve_http(&config.server, app, shutdown.clone()).await
    };
    shutdown.cancel();

    let grpc_served = match grpc_task {
        Some(task) => task.await.map_err(anyhow::Error::from).and_then(std::convert::identity),
        None => Ok(()),
    };

    served?;
    grpc_served
}

async fn serve_http(
    server: &ServerConfig,
    app: Router,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&server.address)
        .await
        .with_context(|| format!("failed to bind {}", server.address))?;
    info!(addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await?;

    Ok(())
}

async fn serve_https(
    server: &ServerConfig,
    app: Router,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let tls = RustlsConfig::from_pem_file(&server.tls.cert_path, &server.tls.key_path)
        .await
        .with_context(|| {
            format!(
                "failed to load TLS certificate {} / key {}",
                server.tls.cert_path.display(),
                server.tls.key_path.display()
            )
        })?;

    let addr = lookup_host(&server.address)
        .await?
        .next()
        .with_context(|| format!("address {} did not resolve", server.address))?;

    let handle = Handle::new();
    let drain = handle.clone();
    tokio::spawn(async move {
        shutdown.cancelled().await;
        drain.graceful_shutdown(Some(HTTPS_DRAIN_TIMEOUT));
    });

    info!(%addr, "HTTPS server listening");
    axum_server::bind_rustls(addr, tls)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    Ok(())
}

/// Initialize logging based on configuration.
fn init_logging(config: &AppConfig) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.observability.log_format == "json" {
        subscriber.with(fmt::layer().json()).init();
    } else {
        subscriber.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
