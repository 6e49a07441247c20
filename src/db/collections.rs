//! Collection CRUD operations.

use crate::error::DatabaseError;
use crate::types::{Collection, CollectionId, ItemRef};
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

use super::{CollectionRow, CollectionStore, Database};

/// Attempts at finding an unused random id before giving up
const MAX_ID_ATTEMPTS: usize = 5;

impl Database {
    /// Insert a collection under a freshly generated id
    ///
    /// Ids are random, so a collision with an existing row is possible but
    /// rare; the insert is retried with a new id a few times before failing.
    pub async fn insert_collection(&self, items: &[ItemRef]) -> Result<CollectionId> {
        let items_json = serde_json::to_string(items)?;
        let now = chrono::Utc::now().timestamp();

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let id = CollectionId::generate();
            let result = sqlx::query(
                "INSERT OR IGNORE INTO collections (id, items, created_at) VALUES (?, ?, ?)",
            )
            .bind(id.as_str())
            .bind(&items_json)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert collection: {}",
                    e
                )))
            })?;

            if result.rows_affected() == 1 {
                tracing::debug!(collection_id = %id, items = items.len(), "Stored collection");
                return Ok(id);
            }

            tracing::debug!(collection_id = %id, attempt, "Collection id collision, retrying");
        }

        Err(Error::Database(DatabaseError::QueryFailed(format!(
            "Failed to find an unused collection id after {} attempts",
            MAX_ID_ATTEMPTS
        ))))
    }

    /// Get a collection by id
    pub async fn get_collection(&self, id: &CollectionId) -> Result<Option<Collection>> {
        let row = sqlx::query_as::<_, CollectionRow>(
            "SELECT id, items, created_at FROM collections WHERE id = ?",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get collection: {}",
                e
            )))
        })?;

        row.map(Collection::try_from).transpose()
    }

    /// Delete collections created before the given timestamp
    ///
    /// Returns the number of records deleted.
    pub async fn delete_collections_before(&self, before_timestamp: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM collections WHERE created_at < ?")
            .bind(before_timestamp)
            .execute(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        Ok(result.rows_affected())
    }

    /// Count stored collections
    pub async fn count_collections(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM collections")
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Sqlx)?;

        Ok(count)
    }
}

#[async_trait]
impl CollectionStore for Database {
    async fn create(&self, items: &[ItemRef]) -> Result<CollectionId> {
        self.insert_collection(items).await
    }

    async fn get(&self, id: &CollectionId) -> Result<Collection> {
        self.get_collection(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("collection {}", id)))
    }

    async fn delete_older_than(&self, age: Duration) -> Result<u64> {
        let age_secs = i64::try_from(age.as_secs()).unwrap_or(i64::MAX);
        let cutoff = chrono::Utc::now().timestamp().saturating_sub(age_secs);
        self.delete_collections_before(cutoff).await
    }
}
