//! Integration tests for the gRPC mirror.
//!
//! Each test serves the `UrlShortener` service on a local port and talks to
//! it through the generated client.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tonic::Code;
use tonic::transport::Channel;

use shortener::api::AppState;
use shortener::config::{AppConfig, ServerConfig};
use shortener::grpc::proto::url_shortener_client::UrlShortenerClient;
use shortener::grpc::proto::{
    GetOriginalUrlRequest, GetUserUrlsRequest, PingRequest, ShortenUrlRequest, StatisticsRequest,
};
use shortener::grpc::{self, UrlShortenerService};
use shortener::service::SequenceGenerator;
use shortener::storage::MemoryStorage;

struct GrpcServer {
    client: UrlShortenerClient<Channel>,
    shutdown: CancellationToken,
}

impl GrpcServer {
    async fn start(trusted_subnet: Option<&str>) -> Self {
        let addr = free_addr();
        let config = AppConfig {
            server: ServerConfig {
                trusted_subnet: trusted_subnet.map(|s| s.parse().unwrap()),
                grpc_address: Some(addr.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let storage = Arc::new(MemoryStorage::new(Arc::new(SequenceGenerator::with_prefix(
            "g",
        ))));
        let state =
            AppState::new(Arc::new(config), storage).expect("Failed to create state");

        let shutdown = CancellationToken::new();
        let service = UrlShortenerService::from_state(&state);
        let token = shutdown.clone();
        tokio::spawn(async move {
            grpc::serve(&addr.to_string(), service, token)
                .await
                .expect("gRPC server failed");
        });

        Self {
            client: connect(addr).await,
            shutdown,
        }
    }
}

impl Drop for GrpcServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn free_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    listener.local_addr().expect("Failed to get local addr")
}

async fn connect(addr: SocketAddr) -> UrlShortenerClient<Channel> {
    let mut last_error = None;

    for _ in 0..50 {
        match UrlShortenerClient::connect(format!("http://{addr}")).await {
            Ok(client) => return client,
            Err(err) => {
                last_error = Some(err);
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        }
    }

    panic!("failed to connect gRPC client: {last_error:?}");
}

#[tokio::test]
async fn test_shorten_and_resolve_over_the_wire() {
    let mut server = GrpcServer::start(None).await;

    let shortened = server
        .client
        .shorten_url(ShortenUrlRequest {
            original_url: "https://example.com".to_string(),
            user_id: "user-1".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert!(!shortened.duplicate);

    let short_id = shortened.short_url.rsplit('/').next().unwrap().to_string();
    let resolved = server
        .client
        .get_original_url(GetOriginalUrlRequest { short_id })
        .await
        .unwrap()
        .into_inner();
    assert_eq!(resolved.original_url, "https://example.com");

    let listed = server
        .client
        .api_get_user_urls(GetUserUrlsRequest {
            user_id: "user-1".to_string(),
        })
        .await
        .unwrap()
        .into_inner();
    assert!(listed.exists);
    assert_eq!(listed.urls.len(), 1);
}

#[tokio::test]
async fn test_errors_carry_status_codes() {
    let mut server = GrpcServer::start(None).await;

    let status = server
        .client
        .get_original_url(GetOriginalUrlRequest {
            short_id: "missing".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::NotFound);

    let status = server
        .client
        .shorten_url(ShortenUrlRequest {
            original_url: String::new(),
            user_id: "user-1".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn test_statistics_uses_peer_address() {
    let mut trusted = GrpcServer::start(Some("127.0.0.0/8")).await;
    tokio_test::assert_ok!(trusted.client.ping(PingRequest {}).await);

    let stats = trusted
        .client
        .statistics(StatisticsRequest::default())
        .await
        .unwrap()
        .into_inner();
    assert_eq!(stats.users, 0);
    assert_eq!(stats.urls, 0);

    let mut untrusted = GrpcServer::start(Some("10.0.0.0/8")).await;
    let status = untrusted
        .client
        .statistics(StatisticsRequest::default())
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::PermissionDenied);
}
