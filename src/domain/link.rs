//! Stored link records and backend outcomes.

use serde::{Deserialize, Serialize};

/// A short identifier mapped to its original URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortLink {
    /// Opaque short identifier, unique within a backend.
    pub short_id: String,

    /// URL as submitted by the client.
    pub original_url: String,

    /// User that created the link. Empty for records restored from a backup log.
    pub user_id: String,

    /// Soft-delete flag.
    pub is_deleted: bool,
}

impl ShortLink {
    /// Create a new active link.
    #[must_use]
    pub fn new(
        short_id: impl Into<String>,
        original_url: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            short_id: short_id.into(),
            original_url: original_url.into(),
            user_id: user_id.into(),
            is_deleted: false,
        }
    }

    /// Whether the link still resolves.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

/// Result of asking a backend to store an original URL.
///
/// A duplicate is not a failure: the URL was already shortened and the
/// existing identifier is handed back so the client can still use it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortenOutcome {
    /// A new record was stored under this identifier.
    Created(String),
    /// An active record for the same URL already exists under this identifier.
    Duplicate(String),
}

impl ShortenOutcome {
    /// The short identifier, regardless of outcome.
    #[must_use]
    pub fn short_id(&self) -> &str {
        match self {
            Self::Created(id) | Self::Duplicate(id) => id,
        }
    }

    /// Whether the URL had already been shortened.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

/// Result of resolving a short identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// The link is live and points here.
    Active(String),
    /// The link was soft-deleted (or, for the database backend, never existed).
    Deleted,
}

/// One line of the file backend's backup log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Decimal write counter, starting at 1.
    pub uuid: String,

    /// Short identifier.
    pub short_url: String,

    /// Original URL.
    pub original_url: String,
}

/// Join a base URL and a short identifier into the public short URL.
#[must_use]
pub fn short_url(base_url: &str, short_id: &str) -> String {
    format!("{}/{short_id}", base_url.trim_end_matches('/'))
}
