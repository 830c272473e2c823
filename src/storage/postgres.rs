//! `PostgreSQL` storage backend.
//!
//! Links live in the `urls` table. Duplicate detection is delegated to the
//! unique constraint on `original_url`: the insert is suppressed on conflict
//! and the existing row is fetched instead. Soft-deleted rows keep their
//! `original_url`, so shortening a deleted URL hands back the deleted id.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use tracing::{debug, info};

use crate::domain::{Resolved, ShortenOutcome};
use crate::error::{StorageError, StorageResult};
use crate::service::ShortIdGenerator;
use crate::storage::traits::{LinkStorage, Storage};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Upper bound for a liveness round-trip.
const PING_TIMEOUT: Duration = Duration::from_secs(1);

/// How long to wait for a pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// `PostgreSQL` storage implementation.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
    generator: Arc<dyn ShortIdGenerator>,
}

impl PostgresStorage {
    /// Wrap an existing pool. The schema is assumed to be migrated.
    pub fn new(pool: PgPool, generator: Arc<dyn ShortIdGenerator>) -> Self {
        Self { pool, generator }
    }

    /// Open a pool on `dsn` and bring the schema up to date.
    ///
    /// # Errors
    ///
    /// Returns an error if no connection can be established or a migration
    /// fails.
    pub async fn connect(
        dsn: &str,
        max_connections: u32,
        generator: Arc<dyn ShortIdGenerator>,
    ) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(dsn)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let storage = Self::new(pool, generator);
        storage.migrate().await?;

        Ok(storage)
    }

    /// Apply pending migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> StorageResult<()> {
        MIGRATOR.run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl LinkStorage for PostgresStorage {
    async fn update_data(
        &self,
        original_url: &str,
        user_id: &str,
    ) -> StorageResult<ShortenOutcome> {
        let short_id = self.generator.generate();

        let inserted: Option<String> = sqlx::query_scalar(
            r"
            INSERT INTO urls (user_id, short_url, original_url)
            VALUES ($1, $2, $3)
            ON CONFLICT (original_url) DO NOTHING
            RETURNING short_url
            ",
        )
        .bind(user_id)
        .bind(&short_id)
        .bind(original_url)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(short_id) = inserted {
            return Ok(ShortenOutcome::Created(short_id));
        }

        let existing: String =
            sqlx::query_scalar("SELECT short_url FROM urls WHERE original_url = $1")
                .bind(original_url)
                .fetch_one(&self.pool)
                .await?;

        Ok(ShortenOutcome::Duplicate(existing))
    }

    async fn get_data(&self, short_id: &str) -> StorageResult<Resolved> {
        let row: Option<(String, bool)> =
            sqlx::query_as("SELECT original_url, is_deleted FROM urls WHERE short_url = $1")
                .bind(short_id)
                .fetch_optional(&self.pool)
                .await?;

        // A missing row answers the same as a tombstone.
        Ok(match row {
            Some((original_url, false)) => Resolved::Active(original_url),
            Some((_, true)) | None => Resolved::Deleted,
        })
    }

    async fn batch_delete_urls(&self, user_id: &str, short_ids: &[String]) -> StorageResult<()> {
        let result = sqlx::query(
            "UPDATE urls SET is_deleted = TRUE WHERE user_id = $1 AND short_url = ANY($2)",
        )
        .bind(user_id)
        .bind(short_ids)
        .execute(&self.pool)
        .await?;

        debug!(
            user_id,
            requested = short_ids.len(),
            deleted = result.rows_affected(),
            "Batch delete applied"
        );

        Ok(())
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn ping(&self) -> StorageResult<()> {
        if self.pool.is_closed() {
            return Err(StorageError::Unavailable);
        }

        tokio::time::timeout(PING_TIMEOUT, sqlx::query("SELECT 1").execute(&self.pool))
            .await
            .map_err(|_| StorageError::Connection("ping timed out".to_string()))??;

        Ok(())
    }

    async fn close(&self) -> StorageResult<()> {
        self.pool.close().await;
        info!("Database pool closed");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
