//! Configuration management module.
//!
//! Settings are flat keys (`server_address`, `base_url`, `file_storage_path`,
//! `database_dsn`, `enable_https`, `trusted_subnet`, `grpc_address`, ...) that
//! can come from:
//! - a JSON file named by `CONFIG` or `-c`
//! - command-line flags
//! - environment variables named after the upper-cased key (`BASE_URL`)
//!
//! Later sources override earlier ones: environment > flag > file > default.

mod cli;
mod server;
mod storage;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::{Config, ConfigError, Environment, File, FileFormat, Map};
use serde::Deserialize;
use sqlx::types::ipnetwork::IpNetwork;

pub use cli::Cli;
pub use server::{
    DEFAULT_ADDRESS, DEFAULT_BASE_URL, DEFAULT_GRPC_ADDRESS, DEFAULT_HTTPS_ADDRESS, ServerConfig,
    TlsConfig,
};
pub use storage::{StorageBackend, StorageConfig};

/// Application configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// HTTP server configuration.
    pub server: ServerConfig,

    /// Storage backend configuration.
    pub storage: StorageConfig,

    /// Cookie authentication configuration.
    pub auth: AuthConfig,

    /// Deletion pipeline configuration.
    pub deletion: DeletionConfig,

    /// Observability configuration.
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from the process arguments and environment.
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be read or the result is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let cli = Cli::parse();
        let env: Map<String, String> = std::env::vars().collect();
        Self::from_sources(cli, env)
    }

    /// Build configuration from explicit flag and environment values.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read, a value has the
    /// wrong type, or validation fails.
    pub fn from_sources(cli: Cli, env: Map<String, String>) -> Result<Self, ConfigError> {
        let config_file = env
            .get("CONFIG")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .or_else(|| cli.config.clone());

        let mut builder = Config::builder();
        if let Some(path) = &config_file {
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Json)
                    .required(true),
            );
        }

        let settings: Settings = builder
            .add_source(cli)
            .add_source(
                Environment::default()
                    .source(Some(env))
                    .try_parsing(true)
                    .ignore_empty(true),
            )
            .build()?
            .try_deserialize()?;

        let app_config = Self::try_from(settings)?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.base_url.is_empty() {
            return Err(ConfigError::Message("base_url cannot be empty".to_string()));
        }

        if self.server.request_timeout.is_zero() {
            return Err(ConfigError::Message(
                "request_timeout cannot be 0".to_string(),
            ));
        }

        if self.deletion.workers == 0 {
            return Err(ConfigError::Message("num_workers cannot be 0".to_string()));
        }

        Ok(())
    }
}

/// Flat view of every key, as the layered sources see it.
#[derive(Debug, Deserialize)]
struct Settings {
    #[serde(default = "default_server_address")]
    server_address: String,

    #[serde(default = "default_base_url")]
    base_url: String,

    #[serde(default)]
    file_storage_path: Option<String>,

    #[serde(default)]
    database_dsn: Option<String>,

    #[serde(default)]
    enable_https: bool,

    #[serde(default)]
    trusted_subnet: Option<String>,

    #[serde(default = "default_grpc_address")]
    grpc_address: String,

    #[serde(default = "default_request_timeout")]
    request_timeout: u64,

    #[serde(default = "default_num_workers")]
    num_workers: usize,

    #[serde(default = "default_cookie_secret")]
    cookie_secret: String,

    #[serde(default)]
    tls_cert_path: Option<PathBuf>,

    #[serde(default)]
    tls_key_path: Option<PathBuf>,

    #[serde(default = "default_db_max_connections")]
    db_max_connections: u32,

    #[serde(default = "default_log_level")]
    log_level: String,

    #[serde(default = "default_log_format")]
    log_format: String,
}

fn default_server_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_grpc_address() -> String {
    DEFAULT_GRPC_ADDRESS.to_string()
}

const fn default_request_timeout() -> u64 {
    15
}

const fn default_num_workers() -> usize {
    15
}

fn default_cookie_secret() -> String {
    DEFAULT_COOKIE_SECRET.to_string()
}

const fn default_db_max_connections() -> u32 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<Settings> for AppConfig {
    type Error = ConfigError;

    fn try_from(settings: Settings) -> Result<Self, Self::Error> {
        let trusted_subnet = non_empty(settings.trusted_subnet)
            .map(|cidr| {
                cidr.trim().parse::<IpNetwork>().map_err(|e| {
                    ConfigError::Message(format!("trusted_subnet {cidr:?} is not a CIDR: {e}"))
                })
            })
            .transpose()?;

        let tls_defaults = TlsConfig::default();
        let mut server = ServerConfig {
            address: settings.server_address,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            enable_https: settings.enable_https,
            tls: TlsConfig {
                cert_path: settings.tls_cert_path.unwrap_or(tls_defaults.cert_path),
                key_path: settings.tls_key_path.unwrap_or(tls_defaults.key_path),
            },
            request_timeout: Duration::from_secs(settings.request_timeout),
            trusted_subnet,
            grpc_address: non_empty(Some(settings.grpc_address)).map(|a| a.trim().to_string()),
        };
        server.apply_https_defaults();

        Ok(Self {
            server,
            storage: StorageConfig {
                database_dsn: non_empty(settings.database_dsn),
                file_storage_path: non_empty(settings.file_storage_path).map(PathBuf::from),
                db_max_connections: settings.db_max_connections,
            },
            auth: AuthConfig {
                cookie_secret: settings.cookie_secret,
            },
            deletion: DeletionConfig {
                workers: settings.num_workers,
            },
            observability: ObservabilityConfig {
                log_level: settings.log_level,
                log_format: settings.log_format,
            },
        })
    }
}

const DEFAULT_COOKIE_SECRET: &str = "shortener-development-cookie-key";

/// Cookie authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC key for signing `AuthToken` cookies.
    pub cookie_secret: String,
}

impl AuthConfig {
    /// Whether the built-in development key is still in use.
    #[must_use]
    pub fn uses_default_secret(&self) -> bool {
        self.cookie_secret == DEFAULT_COOKIE_SECRET
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_secret: default_cookie_secret(),
        }
    }
}

/// Deletion pipeline configuration.
#[derive(Debug, Clone)]
pub struct DeletionConfig {
    /// Worker tasks spawned per deletion request.
    pub workers: usize,
}

impl Default for DeletionConfig {
    fn default() -> Self {
        Self {
            workers: default_num_workers(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Log level.
    pub log_level: String,

    /// Log format: "text" or "json".
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}
