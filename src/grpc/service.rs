//! `UrlShortener` service implementation.

use std::net::IpAddr;
use std::sync::Arc;

use sqlx::types::ipnetwork::IpNetwork;
use tonic::{Request, Response, Status};
use tracing::debug;

use crate::api::AppState;
use crate::domain::{BatchRequestEntry, Resolved};
use crate::grpc::proto::{self, url_shortener_server::UrlShortener};
use crate::service::{UrlService, log_deleted};

/// gRPC front for a [`UrlService`].
#[derive(Clone)]
pub struct UrlShortenerService {
    url_service: Arc<UrlService>,
    trusted_subnet: Option<IpNetwork>,
}

impl UrlShortenerService {
    /// Wrap `url_service`. `Statistics` answers only to `trusted_subnet`.
    #[must_use]
    pub const fn new(url_service: Arc<UrlService>, trusted_subnet: Option<IpNetwork>) -> Self {
        Self {
            url_service,
            trusted_subnet,
        }
    }

    /// Share the HTTP side's service and trusted subnet.
    #[must_use]
    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            Arc::clone(&state.url_service),
            state.config.server.trusted_subnet,
        )
    }

    async fn shorten(
        &self,
        request: proto::ShortenUrlRequest,
    ) -> Result<Response<proto::ShortenUrlResponse>, Status> {
        let outcome = self
            .url_service
            .shorten_url(&request.original_url, &request.user_id)
            .await?;

        Ok(Response::new(proto::ShortenUrlResponse {
            short_url: self.url_service.short_url(outcome.short_id()),
            duplicate: outcome.is_duplicate(),
        }))
    }

    fn check_trusted<T>(&self, request: &Request<T>, client_ip: &str) -> Result<(), Status> {
        let Some(subnet) = self.trusted_subnet else {
            debug!("Trusted subnet not configured");
            return Err(Status::permission_denied("trusted subnet not configured"));
        };

        let ip = match client_ip.trim() {
            "" => request.remote_addr().map(|addr| addr.ip()),
            given => Some(
                given
                    .parse::<IpAddr>()
                    .map_err(|_| Status::invalid_argument(format!("bad client_ip {given:?}")))?,
            ),
        }
        .map(|ip| ip.to_canonical());

        match ip {
            Some(ip) if subnet.contains(ip) => Ok(()),
            ip => {
                debug!(client_ip = ?ip, %subnet, "Client outside trusted subnet");
                Err(Status::permission_denied("client outside trusted subnet"))
            }
        }
    }
}

impl From<proto::BatchRequestEntry> for BatchRequestEntry {
    fn from(entry: proto::BatchRequestEntry) -> Self {
        Self {
            correlation_id: entry.correlation_id,
            original_url: entry.original_url,
        }
    }
}

#[tonic::async_trait]
impl UrlShortener for UrlShortenerService {
    async fn shorten_url(
        &self,
        request: Request<proto::ShortenUrlRequest>,
    ) -> Result<Response<proto::ShortenUrlResponse>, Status> {
        self.shorten(request.into_inner()).await
    }

    async fn get_original_url(
        &self,
        request: Request<proto::GetOriginalUrlRequest>,
    ) -> Result<Response<proto::GetOriginalUrlResponse>, Status> {
        let request = request.into_inner();
        let response = match self.url_service.get_original_url(&request.short_id).await? {
            Resolved::Active(original_url) => proto::GetOriginalUrlResponse {
                original_url,
                is_deleted: false,
            },
            Resolved::Deleted => proto::GetOriginalUrlResponse {
                original_url: String::new(),
                is_deleted: true,
            },
        };
        Ok(Response::new(response))
    }

    async fn api_shorten_url(
        &self,
        request: Request<proto::ShortenUrlRequest>,
    ) -> Result<Response<proto::ShortenUrlResponse>, Status> {
        self.shorten(request.into_inner()).await
    }

    async fn api_shorten_batch_url(
        &self,
        request: Request<proto::ShortenBatchRequest>,
    ) -> Result<Response<proto::ShortenBatchResponse>, Status> {
        let request = request.into_inner();
        let entries = request.urls.into_iter().map(Into::into).collect();
        let shortened = self
            .url_service
            .shorten_batch(&request.user_id, entries)
            .await?;

        let results = shortened
            .entries
            .into_iter()
            .map(|entry| proto::BatchResponseEntry {
                correlation_id: entry.correlation_id,
                short_url: entry.short_url,
            })
            .collect();

        Ok(Response::new(proto::ShortenBatchResponse {
            results,
            last_was_duplicate: shortened.last_was_duplicate,
        }))
    }

    async fn api_get_user_urls(
        &self,
        request: Request<proto::GetUserUrlsRequest>,
    ) -> Result<Response<proto::GetUserUrlsResponse>, Status> {
        let user_id = request.into_inner().user_id;
        if user_id.is_empty() {
            return Err(Status::unauthenticated("user_id is required"));
        }

        let response = match self.url_service.user_urls(&user_id) {
            Some(urls) => proto::GetUserUrlsResponse {
                urls: urls
                    .into_iter()
                    .map(|url| proto::UserUrl {
                        short_url: url.short_url,
                        original_url: url.original_url,
                    })
                    .collect(),
                exists: true,
            },
            None => proto::GetUserUrlsResponse {
                urls: Vec::new(),
                exists: false,
            },
        };
        Ok(Response::new(response))
    }

    async fn delete_user_urls(
        &self,
        request: Request<proto::DeleteUserUrlsRequest>,
    ) -> Result<Response<proto::DeleteUserUrlsResponse>, Status> {
        let request = request.into_inner();
        let deleted = self
            .url_service
            .delete_user_urls(&request.user_id, request.url_ids)?;
        tokio::spawn(log_deleted(request.user_id, deleted));

        Ok(Response::new(proto::DeleteUserUrlsResponse { accepted: true }))
    }

    async fn ping(
        &self,
        _request: Request<proto::PingRequest>,
    ) -> Result<Response<proto::PingResponse>, Status> {
        self.url_service.ping().await?;
        Ok(Response::new(proto::PingResponse {}))
    }

    async fn statistics(
        &self,
        request: Request<proto::StatisticsRequest>,
    ) -> Result<Response<proto::StatisticsResponse>, Status> {
        self.check_trusted(&request, &request.get_ref().client_ip)?;

        let stats = self.url_service.statistics();
        Ok(Response::new(proto::StatisticsResponse {
            users: i64::try_from(stats.users).unwrap_or(i64::MAX),
            urls: i64::try_from(stats.urls).unwrap_or(i64::MAX),
        }))
    }
}
