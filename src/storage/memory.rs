//! In-memory storage backend.
//!
//! A single mutex guards the whole table, so concurrent shorten and resolve
//! calls serialize on it. Duplicate detection is a linear scan over active
//! links.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::debug;

use crate::domain::{Resolved, ShortLink, ShortenOutcome};
use crate::error::{StorageError, StorageResult};
use crate::service::ShortIdGenerator;
use crate::storage::traits::{LinkStorage, Storage};

/// In-memory storage implementation.
#[derive(Debug)]
pub struct MemoryStorage {
    links: Mutex<HashMap<String, ShortLink>>,
    generator: Arc<dyn ShortIdGenerator>,
}

impl MemoryStorage {
    /// Create an empty table.
    pub fn new(generator: Arc<dyn ShortIdGenerator>) -> Self {
        Self {
            links: Mutex::new(HashMap::new()),
            generator,
        }
    }

    /// Store `original_url` unless an active link already points at it.
    pub(crate) fn insert(&self, original_url: &str, user_id: &str) -> ShortenOutcome {
        let mut links = self.links.lock();

        if let Some(existing) = links
            .values()
            .find(|link| link.is_active() && link.original_url == original_url)
        {
            return ShortenOutcome::Duplicate(existing.short_id.clone());
        }

        let short_id = self.generator.generate();
        links.insert(
            short_id.clone(),
            ShortLink::new(short_id.clone(), original_url, user_id),
        );

        ShortenOutcome::Created(short_id)
    }

    /// Put a previously persisted link back into the table.
    pub(crate) fn restore(&self, link: ShortLink) {
        self.links.lock().insert(link.short_id.clone(), link);
    }

    pub(crate) fn resolve(&self, short_id: &str) -> StorageResult<Resolved> {
        let links = self.links.lock();
        let link = links
            .get(short_id)
            .ok_or_else(|| StorageError::NotFound(short_id.to_string()))?;

        if link.is_deleted {
            Ok(Resolved::Deleted)
        } else {
            Ok(Resolved::Active(link.original_url.clone()))
        }
    }

    /// Number of stored links.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.lock().len()
    }

    /// Whether the table holds no links.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.lock().is_empty()
    }
}

#[async_trait]
impl LinkStorage for MemoryStorage {
    async fn update_data(
        &self,
        original_url: &str,
        user_id: &str,
    ) -> StorageResult<ShortenOutcome> {
        Ok(self.insert(original_url, user_id))
    }

    async fn get_data(&self, short_id: &str) -> StorageResult<Resolved> {
        self.resolve(short_id)
    }

    async fn batch_delete_urls(&self, user_id: &str, short_ids: &[String]) -> StorageResult<()> {
        // Soft-delete is only persisted by the database backend.
        debug!(user_id, count = short_ids.len(), "Ignoring batch delete");
        Ok(())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
