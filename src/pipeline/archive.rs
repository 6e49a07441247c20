//! Streaming remote items into zip archives on disk
//!
//! Each item's response body is pulled chunk by chunk from the network and
//! written straight into its zip entry. Zip writing is synchronous, so the
//! copy loop runs on the blocking pool while the body is read through a
//! [`SyncIoBridge`] back into the async runtime.
//!
//! Two failure classes are kept apart:
//! - the remote side failing (connection refused, non-success status, a body
//!   that breaks mid-transfer) only skips that item and yields a warning
//! - the archive file itself failing (create, write, finalize) ends the run

use futures::TryStreamExt;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};
use tokio_util::io::{StreamReader, SyncIoBridge};
use tracing::{debug, warn};
use zip::ZipWriter;
use zip::write::FileOptions;

use super::events::{Phase, ProgressEvent};
use super::partition::{PartGroup, ResolvedItem};
use super::sink::ProgressSink;
use crate::error::{ArchiveError, Error, Result};

const COPY_BUFFER_SIZE: usize = 64 * 1024;

/// Result of writing one part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Items fully copied into the archive
    pub entries_written: usize,
    /// Size of the finalized file on disk
    pub artifact_size: u64,
}

/// Where progress for one part goes, and the numbers it is reported against
pub struct PartProgress<'a> {
    /// Event destination
    pub sink: &'a dyn ProgressSink,
    /// Number of items in the whole collection
    pub total_items: usize,
    /// Number of parts in this run
    pub total_parts: usize,
}

impl PartProgress<'_> {
    fn item_event(&self, group: &PartGroup, item: &ResolvedItem, phase: Phase) -> ProgressEvent {
        ProgressEvent::Progress {
            current: item.position(),
            total: self.total_items,
            filename: Some(item.display_name.clone()),
            phase,
            part_number: Some(group.part_number),
            total_parts: Some(self.total_parts),
        }
    }

    fn warning(&self, item: &ResolvedItem, message: String) -> ProgressEvent {
        ProgressEvent::Warning {
            message,
            current: item.position(),
            total: self.total_items,
        }
    }
}

/// Writes part groups into zip files, fetching each item over HTTP
#[derive(Clone)]
pub struct ArchiveWriter {
    client: reqwest::Client,
    compression: zip::CompressionMethod,
}

impl ArchiveWriter {
    /// Create a writer that fetches with `client` and stores entries with `compression`
    pub fn new(client: reqwest::Client, compression: zip::CompressionMethod) -> Self {
        Self {
            client,
            compression,
        }
    }

    /// Write every item of `group` into a new archive at `destination`
    ///
    /// Items are attempted in order. An item whose fetch fails is reported as
    /// a warning and skipped; the archive is still finalized and valid even if
    /// nothing could be added.
    ///
    /// # Errors
    ///
    /// [`Error::Archive`] when the file cannot be created, written or
    /// finalized, and [`Error::ClientDisconnected`] when the sink is gone. The
    /// partially written file is left on disk for the caller to remove.
    pub async fn write_archive(
        &self,
        group: &PartGroup,
        destination: &Path,
        progress: &PartProgress<'_>,
    ) -> Result<ArchiveSummary> {
        let mut archive = PartArchive::create(destination).await?;
        let mut entries_written = 0;

        for item in &group.items {
            progress
                .sink
                .emit(progress.item_event(group, item, Phase::Downloading))
                .await?;

            let response = match self.client.get(&item.url).send().await {
                Ok(response) if response.status().is_success() => response,
                Ok(response) => {
                    warn!(
                        url = %item.url,
                        status = %response.status(),
                        "Remote returned non-success status, skipping item"
                    );
                    progress
                        .sink
                        .emit(progress.warning(
                            item,
                            format!("{} could not be downloaded", item.display_name),
                        ))
                        .await?;
                    continue;
                }
                Err(e) => {
                    warn!(url = %item.url, error = %e, "Failed to fetch item, skipping");
                    progress
                        .sink
                        .emit(progress.warning(
                            item,
                            format!("{} could not be downloaded", item.display_name),
                        ))
                        .await?;
                    continue;
                }
            };

            let body = response.bytes_stream().map_err(std::io::Error::other);
            let reader = SyncIoBridge::new(StreamReader::new(Box::pin(body)));

            match archive
                .append(&item.entry_name, self.entry_options(), reader)
                .await?
            {
                EntryOutcome::Complete(bytes) => {
                    entries_written += 1;
                    debug!(entry = %item.entry_name, bytes, "Added entry");
                    progress
                        .sink
                        .emit(progress.item_event(group, item, Phase::Added))
                        .await?;
                }
                EntryOutcome::Interrupted { copied, reason } => {
                    warn!(
                        url = %item.url,
                        entry = %item.entry_name,
                        copied,
                        error = %reason,
                        "Transfer interrupted, entry left incomplete"
                    );
                    progress
                        .sink
                        .emit(progress.warning(
                            item,
                            format!("{} was interrupted during download", item.display_name),
                        ))
                        .await?;
                }
            }
        }

        let artifact_size = archive.finish().await?;

        Ok(ArchiveSummary {
            entries_written,
            artifact_size,
        })
    }

    /// Every entry carries zip64 headers: the real body length is only known
    /// once it has been copied, and estimates can be far off.
    fn entry_options(&self) -> FileOptions {
        FileOptions::default()
            .compression_method(self.compression)
            .unix_permissions(0o644)
            .large_file(true)
    }
}

/// How copying one entry ended, when the archive itself is still healthy
#[derive(Debug)]
enum EntryOutcome {
    Complete(u64),
    Interrupted { copied: u64, reason: String },
}

enum CopyFailure {
    Source { copied: u64, reason: String },
    Sink(String),
}

/// A zip file being written on disk
struct PartArchive {
    path: PathBuf,
    // Moved onto the blocking pool while an entry is copied
    writer: Option<ZipWriter<File>>,
}

impl PartArchive {
    async fn create(path: &Path) -> Result<Self> {
        let file = tokio::fs::File::create(path).await.map_err(|e| {
            Error::Archive(ArchiveError::CreateFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(ZipWriter::new(file.into_std().await)),
        })
    }

    fn write_failed(&self, entry: &str, reason: impl Into<String>) -> Error {
        Error::Archive(ArchiveError::WriteFailed {
            path: self.path.clone(),
            entry: entry.to_string(),
            reason: reason.into(),
        })
    }

    async fn append<R>(&mut self, entry: &str, options: FileOptions, reader: R) -> Result<EntryOutcome>
    where
        R: Read + Send + 'static,
    {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| self.write_failed(entry, "archive already finalized"))?;
        let name = entry.to_string();

        let (writer, copied) = tokio::task::spawn_blocking(move || {
            let copied = copy_entry(&mut writer, &name, options, reader);
            (writer, copied)
        })
        .await
        .map_err(|e| self.write_failed(entry, e.to_string()))?;

        self.writer = Some(writer);

        match copied {
            Ok(bytes) => Ok(EntryOutcome::Complete(bytes)),
            Err(CopyFailure::Source { copied, reason }) => {
                Ok(EntryOutcome::Interrupted { copied, reason })
            }
            Err(CopyFailure::Sink(reason)) => Err(self.write_failed(entry, reason)),
        }
    }

    /// Write the central directory and return the size of the file on disk
    async fn finish(mut self) -> Result<u64> {
        let path = self.path.clone();
        let finish_failed = |reason: String| {
            Error::Archive(ArchiveError::FinishFailed {
                path: path.clone(),
                reason,
            })
        };

        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| finish_failed("archive already finalized".to_string()))?;

        tokio::task::spawn_blocking(move || -> std::result::Result<(), String> {
            let mut file = writer.finish().map_err(|e| e.to_string())?;
            file.flush().map_err(|e| e.to_string())?;
            file.sync_all().map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| finish_failed(e.to_string()))?
        .map_err(finish_failed)?;

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| finish_failed(e.to_string()))?;

        Ok(metadata.len())
    }
}

/// Copy `reader` into a new entry, telling source failures apart from sink failures
fn copy_entry<W: Write + Seek, R: Read>(
    writer: &mut ZipWriter<W>,
    name: &str,
    options: FileOptions,
    mut reader: R,
) -> std::result::Result<u64, CopyFailure> {
    writer
        .start_file(name, options)
        .map_err(|e| CopyFailure::Sink(e.to_string()))?;

    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut copied: u64 = 0;

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(copied),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(CopyFailure::Source {
                    copied,
                    reason: e.to_string(),
                });
            }
        };

        writer
            .write_all(&buf[..n])
            .map_err(|e| CopyFailure::Sink(e.to_string()))?;
        copied += n as u64;
    }
}
