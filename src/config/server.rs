//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

use sqlx::types::ipnetwork::IpNetwork;

/// Plain-HTTP listen address used when nothing else is configured.
pub const DEFAULT_ADDRESS: &str = "localhost:8080";

/// Base URL matching [`DEFAULT_ADDRESS`].
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Listen address used when HTTPS is enabled without an explicit address.
pub const DEFAULT_HTTPS_ADDRESS: &str = "localhost:8443";

/// gRPC listen address used when nothing else is configured.
pub const DEFAULT_GRPC_ADDRESS: &str = "localhost:3200";

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (host:port, resolved at bind time).
    pub address: String,

    /// Base URL prepended to short identifiers in responses.
    pub base_url: String,

    /// Serve over HTTPS with the configured certificate.
    pub enable_https: bool,

    /// TLS material used when `enable_https` is set.
    pub tls: TlsConfig,

    /// Timeout applied to the synchronous part of each request.
    pub request_timeout: Duration,

    /// Subnet allowed to read internal statistics. `None` forbids everyone.
    pub trusted_subnet: Option<IpNetwork>,

    /// Address of the gRPC mirror. `None` leaves it off.
    pub grpc_address: Option<String>,
}

impl ServerConfig {
    /// Move the address and base URL to their HTTPS defaults when they were
    /// left at the plain-HTTP defaults.
    pub fn apply_https_defaults(&mut self) {
        if !self.enable_https {
            return;
        }
        if self.address == DEFAULT_ADDRESS {
            self.address = DEFAULT_HTTPS_ADDRESS.to_string();
        }
        if self.base_url == DEFAULT_BASE_URL {
            self.base_url = format!("https://{DEFAULT_HTTPS_ADDRESS}");
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            enable_https: false,
            tls: TlsConfig::default(),
            request_timeout: Duration::from_secs(15),
            trusted_subnet: None,
            grpc_address: Some(DEFAULT_GRPC_ADDRESS.to_string()),
        }
    }
}

/// Certificate and key for HTTPS.
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// PEM certificate chain.
    pub cert_path: PathBuf,

    /// PEM private key.
    pub key_path: PathBuf,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_path: PathBuf::from("cert.pem"),
            key_path: PathBuf::from("key.pem"),
        }
    }
}
