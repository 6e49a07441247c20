//! Periodic removal of expired archives and collections

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::RetentionConfig;
use crate::db::CollectionStore;
use crate::error::Result;

/// What one sweep removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Archive files deleted from the download directory
    pub archives_deleted: u64,
    /// Collections deleted from the store
    pub collections_deleted: u64,
}

/// Deletes archive files and stored collections past their retention age
#[derive(Clone)]
pub struct RetentionSweeper {
    store: Arc<dyn CollectionStore>,
    download_dir: std::path::PathBuf,
    config: RetentionConfig,
}

impl RetentionSweeper {
    /// Create a sweeper over `download_dir` and `store`
    pub fn new(
        store: Arc<dyn CollectionStore>,
        download_dir: impl Into<std::path::PathBuf>,
        config: RetentionConfig,
    ) -> Self {
        Self {
            store,
            download_dir: download_dir.into(),
            config,
        }
    }

    /// Run one sweep
    ///
    /// Failures are logged and leave the corresponding count at zero; the
    /// next sweep simply tries again.
    pub async fn sweep_once(&self) -> SweepReport {
        let archives_deleted =
            match delete_stale_archives(&self.download_dir, self.config.artifact_max_age).await {
                Ok(count) => count,
                Err(e) => {
                    error!(dir = ?self.download_dir, error = %e, "Archive sweep failed");
                    0
                }
            };

        let collections_deleted = match self
            .store
            .delete_older_than(self.config.collection_max_age)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                error!(error = %e, "Collection sweep failed");
                0
            }
        };

        if archives_deleted > 0 || collections_deleted > 0 {
            info!(archives_deleted, collections_deleted, "Retention sweep removed expired data");
        } else {
            debug!("Retention sweep found nothing to remove");
        }

        SweepReport {
            archives_deleted,
            collections_deleted,
        }
    }

    /// Spawn the periodic sweep; the first sweep runs immediately
    pub fn spawn(self, cancel_token: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.config.sweep_interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        self.sweep_once().await;
                    }
                    _ = cancel_token.cancelled() => {
                        debug!("Retention sweep stopped");
                        break;
                    }
                }
            }
        })
    }
}

/// Delete `*.zip` regular files in `dir` last modified more than `max_age` ago
pub async fn delete_stale_archives(dir: &Path, max_age: Duration) -> Result<u64> {
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        // Nothing written yet
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let now = SystemTime::now();
    let mut deleted = 0;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
        {
            continue;
        }

        let metadata = match entry.metadata().await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => continue,
            Err(e) => {
                warn!(?path, error = %e, "failed to stat archive");
                continue;
            }
        };

        let age = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .unwrap_or_default();
        if age <= max_age {
            continue;
        }

        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(?path, age_secs = age.as_secs(), "deleted expired archive");
                deleted += 1;
            }
            Err(e) => {
                warn!(?path, error = %e, "failed to delete expired archive");
            }
        }
    }

    Ok(deleted)
}
