//! Per-user ownership registry.
//!
//! Remembers which short URLs each user created so `GET /api/user/urls` can
//! list them. Held only in memory. Entries are never removed, not even when
//! the link is later soft-deleted.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::domain::{UserUrl, short_url};

/// In-memory map from user id to the links that user shortened.
#[derive(Debug, Default)]
pub struct UserRegistry {
    urls: RwLock<HashMap<String, Vec<UserUrl>>>,
}

impl UserRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `user_id` shortened `original_url` to `short_id`.
    pub fn add_url(&self, base_url: &str, user_id: &str, short_id: &str, original_url: &str) {
        let entry = UserUrl {
            short_url: short_url(base_url, short_id),
            original_url: original_url.to_string(),
        };

        self.urls
            .write()
            .entry(user_id.to_string())
            .or_default()
            .push(entry);
    }

    /// Links recorded for `user_id`, or `None` if the user never shortened anything.
    #[must_use]
    pub fn user_urls(&self, user_id: &str) -> Option<Vec<UserUrl>> {
        self.urls.read().get(user_id).cloned()
    }

    /// Number of users with at least one recorded link.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.urls.read().len()
    }

    /// Total number of recorded links across all users.
    #[must_use]
    pub fn url_count(&self) -> usize {
        self.urls.read().values().map(Vec::len).sum()
    }
}
