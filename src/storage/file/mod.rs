//! File-backed storage.
//!
//! Links live in an in-memory table; every new link is also appended to a
//! newline-delimited JSON log so the table can be rebuilt on restart:
//!
//! ```text
//! {"uuid":"1","short_url":"Xa3_kP0q9z","original_url":"https://example.com"}
//! {"uuid":"2","short_url":"bQ7-Lm2wYc","original_url":"https://rust-lang.org"}
//! ```
//!
//! On open the log is replayed into the table and replaced, via a temporary
//! file and a rename, by a renumbered copy holding the same links.

mod backup;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::{Resolved, ShortLink, ShortenOutcome};
use crate::error::StorageResult;
use crate::service::ShortIdGenerator;
use crate::storage::memory::MemoryStorage;
use crate::storage::traits::{LinkStorage, Storage};

pub use backup::{BackupLog, EVENT_BUFFER};

/// File-backed storage implementation.
#[derive(Debug)]
pub struct FileStorage {
    /// Authoritative link table.
    table: MemoryStorage,
    /// Asynchronous mirror of the table.
    backup: BackupLog,
}

impl FileStorage {
    /// Restore links from the log at `path` and start mirroring new ones to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be opened or contains a malformed
    /// line. The log is left untouched in the latter case.
    pub async fn open(path: &Path, generator: Arc<dyn ShortIdGenerator>) -> StorageResult<Self> {
        let (backup, records) = BackupLog::open(path).await?;
        let table = MemoryStorage::new(generator);

        let restored = records.len();
        for record in records {
            table.restore(ShortLink::new(record.short_url, record.original_url, ""));
        }

        info!(path = %path.display(), restored, "File storage opened");

        Ok(Self { table, backup })
    }

    /// Number of links in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table holds no links.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[async_trait]
impl LinkStorage for FileStorage {
    async fn update_data(
        &self,
        original_url: &str,
        user_id: &str,
    ) -> StorageResult<ShortenOutcome> {
        let outcome = self.table.insert(original_url, user_id);

        if let ShortenOutcome::Created(short_id) = &outcome {
            self.backup
                .append(short_id.clone(), original_url.to_string())
                .await;
        }

        Ok(outcome)
    }

    async fn get_data(&self, short_id: &str) -> StorageResult<Resolved> {
        self.table.resolve(short_id)
    }

    async fn batch_delete_urls(&self, user_id: &str, short_ids: &[String]) -> StorageResult<()> {
        self.table.batch_delete_urls(user_id, short_ids).await
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        self.backup.close().await;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileRecord;
    use crate::error::StorageError;
    use crate::service::SequenceGenerator;
    use tempfile::TempDir;

    async fn open_storage(path: &Path, prefix: &str) -> FileStorage {
        FileStorage::open(path, Arc::new(SequenceGenerator::with_prefix(prefix)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_links_survive_restart() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("urls.json");

        let storage = open_storage(&path, "a").await;
        let first = storage
            .update_data("https://a.com", "user-1")
            .await
            .unwrap();
        let second = storage
            .update_data("https://b.com", "user-1")
            .await
            .unwrap();
        storage.close().await.unwrap();

        let reopened = open_storage(&path, "b").await;
        assert_eq!(reopened.len(), 2);
        assert_eq!(
            reopened.get_data(first.short_id()).await.unwrap(),
            Resolved::Active("https://a.com".to_string())
        );
        assert_eq!(
            reopened.get_data(second.short_id()).await.unwrap(),
            Resolved::Active("https://b.com".to_string())
        );

        let again = reopened
            .update_data("https://a.com", "user-2")
            .await
            .unwrap();
        assert_eq!(again, ShortenOutcome::Duplicate(first.short_id().to_string()));
        reopened.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_restore_rewrites_log() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("urls.json");
        tokio::fs::write(
            &path,
            concat!(
                "{\"uuid\":\"10\",\"short_url\":\"abc\",\"original_url\":\"https://a.com\"}\n",
                "{\"uuid\":\"11\",\"short_url\":\"def\",\"original_url\":\"https://b.com\"}\n",
            ),
        )
        .await
        .unwrap();

        let storage = open_storage(&path, "x").await;
        storage.close().await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let records: Vec<FileRecord> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].uuid, "1");
        assert_eq!(records[0].short_url, "abc");
        assert_eq!(records[1].uuid, "2");
        assert_eq!(records[1].short_url, "def");
    }

    #[tokio::test]
    async fn test_restored_links_stay_on_disk_after_unclean_stop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("urls.json");

        let storage = open_storage(&path, "a").await;
        for i in 0..3 {
            storage
                .update_data(&format!("https://{i}.com"), "user-1")
                .await
                .unwrap();
        }
        storage.close().await.unwrap();

        // Reopen and stop without closing, as a failed startup would.
        let reopened = open_storage(&path, "b").await;
        assert_eq!(reopened.len(), 3);
        drop(reopened);

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents.lines().count(), 3);

        let restored = open_storage(&path, "c").await;
        assert_eq!(restored.len(), 3);
        restored.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicates_are_not_logged_twice() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("urls.json");

        let storage = open_storage(&path, "a").await;
        storage
            .update_data("https://a.com", "user-1")
            .await
            .unwrap();
        storage
            .update_data("https://a.com", "user-1")
            .await
            .unwrap();
        storage.close().await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let storage = open_storage(&temp_dir.path().join("urls.json"), "a").await;

        let result = storage.get_data("missing").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_ping_and_name() {
        let temp_dir = TempDir::new().unwrap();
        let storage = open_storage(&temp_dir.path().join("urls.json"), "a").await;

        tokio_test::assert_ok!(storage.ping().await);
        assert_eq!(storage.backend_name(), "file");
        assert!(storage.is_empty());
    }
}
