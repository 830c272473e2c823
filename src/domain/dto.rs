//! Data Transfer Objects for API requests and responses.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/shorten` (and JSON bodies of `POST /`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenRequest {
    /// URL to shorten.
    pub url: String,
}

/// Response of `POST /api/shorten`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenResponse {
    /// Full short URL.
    pub result: String,
}

/// One item of a batch shorten request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequestEntry {
    /// Client-chosen identifier echoed back in the response.
    pub correlation_id: String,

    /// URL to shorten.
    pub original_url: String,
}

/// One item of a batch shorten response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResponseEntry {
    /// Correlation id copied from the request.
    pub correlation_id: String,

    /// Full short URL.
    pub short_url: String,
}

/// A link owned by a user, as listed by `GET /api/user/urls`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUrl {
    /// Full short URL.
    pub short_url: String,

    /// Original URL.
    pub original_url: String,
}

/// Response of `GET /api/internal/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Number of recorded user links.
    pub urls: usize,

    /// Number of users with at least one link.
    pub users: usize,
}
