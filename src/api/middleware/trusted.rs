//! Trusted subnet gate for internal endpoints.

use std::net::{IpAddr, SocketAddr};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::api::state::AppState;
use crate::error::AppError;

/// Header carrying the client address when behind a proxy.
pub const REAL_IP_HEADER: &str = "x-real-ip";

/// Client address from `X-Real-IP`, if present and parseable.
fn real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get(REAL_IP_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Client address, preferring `X-Real-IP` over the peer address.
fn client_ip(req: &Request<Body>) -> Option<IpAddr> {
    real_ip(req.headers())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .map(|ip| ip.to_canonical())
}

/// Middleware that only lets through clients inside the trusted subnet.
///
/// Everything is forbidden when no subnet is configured.
pub async fn require_trusted_subnet(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(subnet) = state.config.server.trusted_subnet else {
        debug!("Trusted subnet not configured");
        return AppError::Forbidden.into_response();
    };

    match client_ip(&req) {
        Some(ip) if subnet.contains(ip) => next.run(req).await,
        ip => {
            debug!(client_ip = ?ip, %subnet, "Client outside trusted subnet");
            AppError::Forbidden.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_real_ip_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert(REAL_IP_HEADER, HeaderValue::from_static(" 10.0.0.7 "));
        assert_eq!(real_ip(&headers), Some("10.0.0.7".parse().unwrap()));
    }

    #[test]
    fn test_real_ip_garbage_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(REAL_IP_HEADER, HeaderValue::from_static("not-an-ip"));
        assert_eq!(real_ip(&headers), None);
    }

    #[test]
    fn test_client_ip_falls_back_to_peer() {
        let mut req = Request::new(Body::empty());
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 5], 4000))));
        assert_eq!(client_ip(&req), Some("192.168.1.5".parse().unwrap()));
    }

    #[test]
    fn test_client_ip_prefers_header() {
        let mut req = Request::new(Body::empty());
        req.headers_mut()
            .insert(REAL_IP_HEADER, HeaderValue::from_static("10.1.2.3"));
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 5], 4000))));
        assert_eq!(client_ip(&req), Some("10.1.2.3".parse().unwrap()));
    }

    #[test]
    fn test_mapped_ipv6_is_canonicalized() {
        let mut headers = HeaderMap::new();
        headers.insert(REAL_IP_HEADER, HeaderValue::from_static("::ffff:10.0.0.1"));
        let mut req = Request::new(Body::empty());
        *req.headers_mut() = headers;
        assert_eq!(client_ip(&req), Some("10.0.0.1".parse().unwrap()));
    }
}
