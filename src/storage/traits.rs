//! Storage trait definitions.
//!
//! These traits define the interface every backend satisfies, so the URL
//! service and the deletion pipeline never know which one they are talking to.

use async_trait::async_trait;

use crate::domain::{Resolved, ShortenOutcome};
use crate::error::StorageResult;

/// Link mapping operations.
#[async_trait]
pub trait LinkStorage: Send + Sync {
    /// Store `original_url` for `user_id` under a freshly generated short id.
    ///
    /// If an active record for the same URL already exists, nothing is stored
    /// and its id is returned as [`ShortenOutcome::Duplicate`].
    async fn update_data(&self, original_url: &str, user_id: &str)
    -> StorageResult<ShortenOutcome>;

    /// Resolve a short id.
    ///
    /// How an unknown id is reported is backend specific: the database backend
    /// answers [`Resolved::Deleted`], the in-memory backends return
    /// [`StorageError::NotFound`](crate::error::StorageError::NotFound).
    async fn get_data(&self, short_id: &str) -> StorageResult<Resolved>;

    /// Soft-delete every listed short id owned by `user_id` in one call.
    ///
    /// Safe to call concurrently for disjoint id sets of the same user.
    async fn batch_delete_urls(&self, user_id: &str, short_ids: &[String]) -> StorageResult<()>;
}

/// Combined storage trait for all storage operations.
#[async_trait]
pub trait Storage: LinkStorage {
    /// Check if the storage backend is reachable.
    async fn ping(&self) -> StorageResult<()>;

    /// Release backend resources.
    async fn close(&self) -> StorageResult<()>;

    /// Get the storage backend name.
    fn backend_name(&self) -> &'static str;
}

/// Trait object alias for Storage.
pub type DynStorage = dyn Storage;
