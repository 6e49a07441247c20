//! Database layer for reelzip
//!
//! Handles SQLite persistence for stored collections.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] - Database lifecycle, schema migrations
//! - [`collections`] - Collection CRUD and age-based deletion

use crate::Result;
use crate::types::{Collection, CollectionId, ItemRef};
use async_trait::async_trait;
use sqlx::{FromRow, sqlite::SqlitePool};
use std::time::Duration;

mod collections;
mod migrations;

/// Keyed storage of collections, consulted by the pipeline and the retention sweep
///
/// The SQLite [`Database`] is the production implementation; tests swap in
/// in-memory stores.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Store a new collection and return its freshly generated id
    async fn create(&self, items: &[ItemRef]) -> Result<CollectionId>;

    /// Fetch a collection by id
    ///
    /// # Errors
    ///
    /// Returns an error for which [`crate::Error::is_not_found`] is true when
    /// no collection with this id exists.
    async fn get(&self, id: &CollectionId) -> Result<Collection>;

    /// Delete collections stored more than `age` ago, returning how many were removed
    async fn delete_older_than(&self, age: Duration) -> Result<u64>;
}

/// Collection record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub(crate) struct CollectionRow {
    /// Collection id
    pub id: String,
    /// JSON-encoded item list
    pub items: String,
    /// Unix timestamp when the collection was stored
    pub created_at: i64,
}

impl TryFrom<CollectionRow> for Collection {
    type Error = crate::Error;

    fn try_from(row: CollectionRow) -> Result<Self> {
        use chrono::{TimeZone, Utc};

        Ok(Collection {
            id: CollectionId::parse(&row.id)?,
            items: serde_json::from_str(&row.items)?,
            created_at: Utc
                .timestamp_opt(row.created_at, 0)
                .single()
                .unwrap_or_else(Utc::now),
        })
    }
}

/// Database handle for reelzip
pub struct Database {
    pool: SqlitePool,
}
