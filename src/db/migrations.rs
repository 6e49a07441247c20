//! Database lifecycle and schema migrations.

use crate::error::DatabaseError;
use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};
use std::path::Path;
use std::str::FromStr;

use super::Database;

/// Schema steps in version order; a fresh database applies all of them
const MIGRATIONS: &[(i64, &[&str])] = &[(
    1,
    &[
        r#"
        CREATE TABLE collections (
            id TEXT PRIMARY KEY,
            items TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )
        "#,
        "CREATE INDEX idx_collections_created_at ON collections(created_at)",
    ],
)];

fn connection_failed(context: &str) -> impl FnOnce(sqlx::Error) -> Error + '_ {
    move |e| Error::Database(DatabaseError::ConnectionFailed(format!("{context}: {e}")))
}

fn migration_failed(context: String) -> impl FnOnce(sqlx::Error) -> Error {
    move |e| Error::Database(DatabaseError::MigrationFailed(format!("{context}: {e}")))
}

impl Database {
    /// Open (or create) the SQLite file at `path` and bring its schema up to date
    ///
    /// Missing parent directories are created. The database runs in WAL mode.
    pub async fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to create database directory '{}': {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(connection_failed("Invalid database path"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(connection_failed("Failed to open database"))?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Apply every migration newer than the recorded schema version
    async fn run_migrations(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(migration_failed("Failed to create schema_version table".into()))?;

        let applied: i64 =
            sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(version) FROM schema_version")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to read schema version: {}",
                        e
                    )))
                })?
                .unwrap_or(0);

        for &(version, statements) in MIGRATIONS.iter().filter(|(v, _)| *v > applied) {
            self.apply_migration(version, statements).await?;
        }

        Ok(())
    }

    /// Run one migration's statements and record its version in a single transaction
    ///
    /// Dropping the transaction on an error path rolls it back.
    async fn apply_migration(&self, version: i64, statements: &[&str]) -> Result<()> {
        tracing::info!(version, "Applying database migration");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(migration_failed(format!("Failed to begin migration v{version}")))?;

        for statement in statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(migration_failed(format!("Migration v{version} failed")))?;
        }

        sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?, ?)")
            .bind(version)
            .bind(chrono::Utc::now().timestamp())
            .execute(&mut *tx)
            .await
            .map_err(migration_failed(format!("Failed to record migration v{version}")))?;

        tx.commit()
            .await
            .map_err(migration_failed(format!("Failed to commit migration v{version}")))?;

        tracing::info!(version, "Database migration complete");
        Ok(())
    }

    /// Close the connection pool
    ///
    /// Later queries on this handle (or any clone of it) fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
