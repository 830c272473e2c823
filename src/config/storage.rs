//! Storage configuration.

use std::path::PathBuf;

/// Storage backend type, in selection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// `PostgreSQL` table.
    Database,
    /// In-memory map mirrored to an append-only log.
    File,
    /// In-memory map only.
    Memory,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Database => write!(f, "database"),
            Self::File => write!(f, "file"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Postgres connection string.
    pub database_dsn: Option<String>,

    /// Backup log path for the file backend.
    pub file_storage_path: Option<PathBuf>,

    /// Maximum pooled database connections.
    pub db_max_connections: u32,
}

impl StorageConfig {
    /// The backend the selector tries first.
    #[must_use]
    pub const fn preferred_backend(&self) -> StorageBackend {
        if self.database_dsn.is_some() {
            StorageBackend::Database
        } else if self.file_storage_path.is_some() {
            StorageBackend::File
        } else {
            StorageBackend::Memory
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_dsn: None,
            file_storage_path: None,
            db_max_connections: 10,
        }
    }
}
