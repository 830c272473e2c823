//! URL shortening service.
//!
//! Orchestrates the storage backend, the ownership registry and the deletion
//! pipeline, and turns backend errors into request-level outcomes.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::domain::{
    BatchRequestEntry, BatchResponseEntry, Resolved, ShortenOutcome, StatsResponse, UserUrl,
    short_url,
};
use crate::error::{AppError, Result, StorageError};
use crate::service::deletion::{DeletionJob, DeletionPipeline};
use crate::service::users::UserRegistry;
use crate::storage::traits::Storage;

/// Result of a batch shorten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchShortened {
    /// One entry per request item, in request order.
    pub entries: Vec<BatchResponseEntry>,
    /// Whether the last item processed was a duplicate. Earlier duplicates do
    /// not affect this flag.
    pub last_was_duplicate: bool,
}

/// Service for shortening and resolving URLs.
pub struct UrlService {
    /// Storage backend.
    storage: Arc<dyn Storage>,
    /// Links per user.
    registry: Arc<UserRegistry>,
    /// Background deletion.
    pipeline: DeletionPipeline,
    /// Prefix for public short URLs.
    base_url: String,
}

impl UrlService {
    /// Create a new URL service.
    pub fn new(
        storage: Arc<dyn Storage>,
        registry: Arc<UserRegistry>,
        base_url: impl Into<String>,
        workers: usize,
    ) -> Self {
        let pipeline = DeletionPipeline::new(Arc::clone(&storage), workers);
        Self {
            storage,
            registry,
            pipeline,
            base_url: base_url.into(),
        }
    }

    /// Public URL for a short id.
    #[must_use]
    pub fn short_url(&self, short_id: &str) -> String {
        short_url(&self.base_url, short_id)
    }

    /// Shorten one URL for `user_id`.
    ///
    /// The link is added to the user's list whether it was created or already
    /// existed.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for an empty user id, `BadRequest` for an empty
    /// URL, or a storage error.
    pub async fn shorten_url(&self, original_url: &str, user_id: &str) -> Result<ShortenOutcome> {
        if user_id.is_empty() {
            return Err(AppError::Unauthorized);
        }
        let original_url = original_url.trim();
        if original_url.is_empty() {
            return Err(AppError::BadRequest("url cannot be empty".to_string()));
        }

        let outcome = self.storage.update_data(original_url, user_id).await?;
        self.registry
            .add_url(&self.base_url, user_id, outcome.short_id(), original_url);

        debug!(
            user_id,
            short_id = outcome.short_id(),
            duplicate = outcome.is_duplicate(),
            "URL shortened"
        );

        Ok(outcome)
    }

    /// Shorten every entry in order, one at a time.
    ///
    /// Only newly created links are added to the user's list. An empty batch
    /// yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for an empty user id, `BadRequest` for any empty
    /// URL (before anything is stored), or the first storage error.
    pub async fn shorten_batch(
        &self,
        user_id: &str,
        entries: Vec<BatchRequestEntry>,
    ) -> Result<BatchShortened> {
        if user_id.is_empty() {
            return Err(AppError::Unauthorized);
        }
        if let Some(entry) = entries
            .iter()
            .find(|entry| entry.original_url.trim().is_empty())
        {
            return Err(AppError::BadRequest(format!(
                "original_url is empty for correlation_id {}",
                entry.correlation_id
            )));
        }

        let mut shortened = Vec::with_capacity(entries.len());
        let mut last_was_duplicate = false;

        for entry in entries {
            let original_url = entry.original_url.trim();
            let outcome = self.storage.update_data(original_url, user_id).await?;
            if !outcome.is_duplicate() {
                self.registry
                    .add_url(&self.base_url, user_id, outcome.short_id(), original_url);
            }

            last_was_duplicate = outcome.is_duplicate();
            shortened.push(BatchResponseEntry {
                correlation_id: entry.correlation_id,
                short_url: self.short_url(outcome.short_id()),
            });
        }

        Ok(BatchShortened {
            entries: shortened,
            last_was_duplicate,
        })
    }

    /// Resolve a short id.
    ///
    /// # Errors
    ///
    /// Returns `UnknownShortId` if the backend does not know the id, or a
    /// storage error.
    pub async fn get_original_url(&self, short_id: &str) -> Result<Resolved> {
        self.storage
            .get_data(short_id)
            .await
            .map_err(|e| match e {
                StorageError::NotFound(id) => AppError::UnknownShortId(id),
                other => AppError::Storage(other),
            })
    }

    /// Start deleting `short_ids` for `user_id` and return immediately.
    ///
    /// The returned channel yields each deleted id and closes when the
    /// pipeline is done; dropping it does not cancel the delete.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` for an empty user id.
    pub fn delete_user_urls(
        &self,
        user_id: &str,
        short_ids: Vec<String>,
    ) -> Result<mpsc::Receiver<String>> {
        if user_id.is_empty() {
            return Err(AppError::Unauthorized);
        }

        info!(user_id, count = short_ids.len(), "Deletion requested");
        Ok(self.pipeline.launch(DeletionJob {
            user_id: user_id.to_string(),
            short_ids,
        }))
    }

    /// Links recorded for `user_id`.
    #[must_use]
    pub fn user_urls(&self, user_id: &str) -> Option<Vec<UserUrl>> {
        self.registry.user_urls(user_id)
    }

    /// Aggregate counts from the ownership registry.
    #[must_use]
    pub fn statistics(&self) -> StatsResponse {
        StatsResponse {
            urls: self.registry.url_count(),
            users: self.registry.user_count(),
        }
    }

    /// Check backend liveness.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend is unreachable.
    pub async fn ping(&self) -> Result<()> {
        self.storage.ping().await?;
        Ok(())
    }
}
