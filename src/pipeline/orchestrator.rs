//! Pipeline run orchestration - top-level lifecycle for one archive request.

use rand::Rng;
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info, warn};

use super::ArchivePipeline;
use super::archive::PartProgress;
use super::events::{ArchiveArtifact, Phase, ProgressEvent};
use super::partition::{PartGroup, ResolvedItem, partition};
use super::sink::ProgressSink;
use crate::error::{ArchiveError, Error, Result};
use crate::types::CollectionId;
use crate::utils::format_size;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every part was written and the summary event delivered
    Completed(Vec<ArchiveArtifact>),
    /// The run could not proceed; an `error` event carrying this message was emitted
    Failed(String),
    /// The event consumer went away before the run finished
    Abandoned,
}

impl ArchivePipeline {
    /// Materialize collection `id` as one or more zip archives, reporting to `sink`
    ///
    /// Phases:
    /// 1. Load the collection (unknown id fails before anything else is emitted)
    /// 2. Look up every item's size
    /// 3. Partition items into parts under the configured ceiling
    /// 4. Write one archive per part, in order
    /// 5. Emit `complete` for a single archive or `complete_multipart` otherwise
    ///
    /// Every run that is not abandoned ends with exactly one terminal event.
    pub async fn run(&self, id: &CollectionId, sink: &dyn ProgressSink) -> RunOutcome {
        match self.execute(id, sink).await {
            Ok(artifacts) => RunOutcome::Completed(artifacts),
            Err(Error::ClientDisconnected) => {
                info!(collection_id = %id, "Client disconnected, abandoning archive run");
                RunOutcome::Abandoned
            }
            Err(e) => {
                if e.is_not_found() {
                    warn!(collection_id = %id, "Archive requested for unknown collection");
                } else {
                    error!(collection_id = %id, error = %e, "Archive run failed");
                }

                let message = failure_message(&e);
                if sink
                    .emit(ProgressEvent::Error {
                        message: message.clone(),
                    })
                    .await
                    .is_err()
                {
                    debug!(collection_id = %id, "Client gone before the error could be delivered");
                }
                RunOutcome::Failed(message)
            }
        }
    }

    async fn execute(
        &self,
        id: &CollectionId,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<ArchiveArtifact>> {
        // Phase 1: Load the collection
        let collection = self.store.get(id).await?;
        if collection.items.is_empty() {
            return Err(Error::Validation("collection has no items".to_string()));
        }

        let total = collection.items.len();
        info!(collection_id = %id, items = total, "Starting archive run");
        sink.emit(ProgressEvent::Start { total }).await?;

        // Phase 2: Resolve sizes, one HEAD request per item
        let mut resolved = Vec::with_capacity(total);
        for (index, item) in collection.items.iter().enumerate() {
            sink.emit(ProgressEvent::Progress {
                current: index + 1,
                total,
                filename: Some(item.filename.clone()),
                phase: Phase::Checking,
                part_number: None,
                total_parts: None,
            })
            .await?;

            let size_bytes = self.resolver.resolve(&item.url).await;
            resolved.push(ResolvedItem::new(index, item, size_bytes));
        }

        // Phase 3: Partition
        let groups = partition(resolved, self.settings.part_ceiling_bytes);
        let total_parts = groups.len();
        debug!(collection_id = %id, parts = total_parts, "Partitioned collection");

        // Phase 4: Write each part
        let suffix = run_suffix();
        let progress = PartProgress {
            sink,
            total_items: total,
            total_parts,
        };

        let mut artifacts = Vec::with_capacity(total_parts);
        for group in &groups {
            artifacts.push(self.write_part(id, &suffix, group, &progress).await?);
        }

        // Phase 5: Summarize
        let summary = match artifacts.as_slice() {
            [single] => ProgressEvent::Complete {
                download_url: single.url.clone(),
                filename: format!("videos_{}.zip", id),
            },
            parts => ProgressEvent::CompleteMultipart {
                parts: parts.to_vec(),
                total_parts: parts.len(),
            },
        };
        sink.emit(summary).await?;

        info!(collection_id = %id, parts = artifacts.len(), "Archive run complete");
        Ok(artifacts)
    }

    async fn write_part(
        &self,
        id: &CollectionId,
        run_suffix: &str,
        group: &PartGroup,
        progress: &PartProgress<'_>,
    ) -> Result<ArchiveArtifact> {
        progress
            .sink
            .emit(part_event(
                group,
                group.first().map_or(0, ResolvedItem::position),
                Phase::CreatingPart,
                progress,
            ))
            .await?;

        let filename = artifact_filename(id, run_suffix, group.part_number);
        let path = self.settings.download_dir.join(&filename);

        let summary = match self.writer.write_archive(group, &path, progress).await {
            Ok(summary) => summary,
            Err(e) => {
                discard_partial(&path).await;
                return Err(e);
            }
        };

        info!(
            collection_id = %id,
            part = group.part_number,
            entries = summary.entries_written,
            items = group.items.len(),
            bytes = summary.artifact_size,
            "Archive part written"
        );

        let artifact = ArchiveArtifact {
            part_number: group.part_number,
            storage_path: path,
            url: format!(
                "{}/{}",
                self.settings.public_path.trim_end_matches('/'),
                filename
            ),
            size: summary.artifact_size,
            size_formatted: format_size(summary.artifact_size),
        };

        progress
            .sink
            .emit(part_event(
                group,
                group.last().map_or(0, ResolvedItem::position),
                Phase::PartComplete,
                progress,
            ))
            .await?;

        Ok(artifact)
    }
}

fn part_event(
    group: &PartGroup,
    current: usize,
    phase: Phase,
    progress: &PartProgress<'_>,
) -> ProgressEvent {
    ProgressEvent::Progress {
        current,
        total: progress.total_items,
        filename: None,
        phase,
        part_number: Some(group.part_number),
        total_parts: Some(progress.total_parts),
    }
}

/// Random hex suffix shared by every part of one run
fn run_suffix() -> String {
    format!("{:08x}", rand::thread_rng().r#gen::<u32>())
}

/// `<collection>_<run>_part<N>.zip`
fn artifact_filename(id: &CollectionId, run_suffix: &str, part_number: usize) -> String {
    format!("{}_{}_part{}.zip", id, run_suffix, part_number)
}

/// Message sent to the client in the terminal `error` event
fn failure_message(error: &Error) -> String {
    match error {
        e if e.is_not_found() => "Collection not found".to_string(),
        Error::Validation(message) => message.clone(),
        Error::Archive(ArchiveError::CreateFailed { .. }) => "Could not create archive".to_string(),
        Error::Archive(_) => "Could not write archive".to_string(),
        Error::Database(_) | Error::Sqlx(_) => "Could not load collection".to_string(),
        _ => "Archive could not be completed".to_string(),
    }
}

async fn discard_partial(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!(?path, "deleted unfinished archive"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(?path, error = %e, "failed to delete unfinished archive"),
    }
}
