//! Command-line flags.
//!
//! Flags sit between the JSON config file and the environment in the
//! precedence chain, so they are fed to the `config` builder as their own
//! [`Source`].

use std::path::PathBuf;

use clap::Parser;
use config::{ConfigError, Map, Source, Value};

/// Command-line arguments.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "shortener", version, about = "URL shortening service")]
pub struct Cli {
    /// Address to listen on (host:port).
    #[arg(short = 'a', long = "address")]
    pub server_address: Option<String>,

    /// Base URL prepended to short identifiers.
    #[arg(short = 'b', long = "base-url")]
    pub base_url: Option<String>,

    /// Path of the backup log for the file backend.
    #[arg(short = 'f', long = "file-storage-path")]
    pub file_storage_path: Option<String>,

    /// Postgres connection string.
    #[arg(short = 'd', long = "database-dsn")]
    pub database_dsn: Option<String>,

    /// Serve over HTTPS.
    #[arg(short = 's', long = "enable-https")]
    pub enable_https: bool,

    /// JSON configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// CIDR allowed to read internal statistics.
    #[arg(short = 't', long = "trusted-subnet")]
    pub trusted_subnet: Option<String>,

    /// gRPC listen address (host:port).
    #[arg(short = 'g', long = "grpc-address")]
    pub grpc_address: Option<String>,
}

impl Source for Cli {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        let origin = "command line".to_string();
        let mut map = Map::new();

        let strings = [
            ("server_address", &self.server_address),
            ("base_url", &self.base_url),
            ("file_storage_path", &self.file_storage_path),
            ("database_dsn", &self.database_dsn),
            ("trusted_subnet", &self.trusted_subnet),
            ("grpc_address", &self.grpc_address),
        ];
        for (key, value) in strings
            .into_iter()
            .filter_map(|(key, value)| value.as_ref().map(|v| (key, v)))
        {
            map.insert(key.to_string(), Value::new(Some(&origin), value.as_str()));
        }

        // A bare switch cannot express "false", so only a set flag overrides.
        if self.enable_https {
            map.insert("enable_https".to_string(), Value::new(Some(&origin), true));
        }

        Ok(map)
    }
}
