//! gRPC mirror of the HTTP API.
//!
//! Every RPC is a thin wrapper over [`UrlService`](crate::service::UrlService)
//! and shares its ownership registry with the HTTP side. Callers name their
//! user id in the request instead of carrying a cookie.

mod error;
mod service;

use anyhow::Context;
use tokio::net::lookup_host;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use proto::url_shortener_server::UrlShortenerServer;
pub use service::UrlShortenerService;

/// Generated message and service types for `shortener.v1`.
#[allow(clippy::all, clippy::pedantic, clippy::nursery)]
pub mod proto {
    tonic::include_proto!("shortener.v1");
}

/// Serve `service` on `address` until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the address does not resolve or the server fails.
pub async fn serve(
    address: &str,
    service: UrlShortenerService,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let addr = lookup_host(address)
        .await
        .with_context(|| format!("failed to resolve gRPC address {address}"))?
        .next()
        .with_context(|| format!("address {address} did not resolve"))?;

    info!(%addr, "gRPC server listening");
    tonic::transport::Server::builder()
        .add_service(UrlShortenerServer::new(service))
        .serve_with_shutdown(addr, async move { shutdown.cancelled().await })
        .await
        .with_context(|| format!("gRPC server on {addr} failed"))?;

    info!("gRPC server stopped");
    Ok(())
}
