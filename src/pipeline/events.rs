//! Progress events streamed to the client during a pipeline run

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

/// Phase tag carried by `progress` events
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Probing an item's size
    Checking,
    /// Opening the archive for a part
    CreatingPart,
    /// Streaming an item into the current archive
    Downloading,
    /// Item fully written into the current archive
    Added,
    /// Archive for a part has been finalized
    PartComplete,
}

/// One finished archive file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveArtifact {
    /// 1-based part number, matches group order
    pub part_number: usize,
    /// Location on disk (never sent to clients)
    #[serde(skip)]
    pub storage_path: PathBuf,
    /// Public download URL
    pub url: String,
    /// Size of the finished file in bytes
    pub size: u64,
    /// Human-readable size
    pub size_formatted: String,
}

/// A single unit of the progress stream
///
/// Serialized with a `type` tag and camelCase fields. Optional fields are
/// omitted when absent:
///
/// ```json
/// {"type":"progress","current":2,"total":3,"filename":"b.mp4","phase":"added","partNumber":1,"totalParts":1}
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Run started
    Start {
        /// Number of items in the collection
        total: usize,
    },
    /// Phase transition for one item or part
    #[serde(rename_all = "camelCase")]
    Progress {
        /// 1-based item position
        current: usize,
        /// Number of items in the collection
        total: usize,
        /// Item display name
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
        /// What is happening
        phase: Phase,
        /// Part being worked on, once partitioning happened
        #[serde(default, skip_serializing_if = "Option::is_none")]
        part_number: Option<usize>,
        /// Number of parts, once partitioning happened
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total_parts: Option<usize>,
    },
    /// An item was skipped
    Warning {
        /// What went wrong
        message: String,
        /// 1-based position of the skipped item
        current: usize,
        /// Number of items in the collection
        total: usize,
    },
    /// The run could not proceed
    Error {
        /// What went wrong
        message: String,
    },
    /// Exactly one archive was produced
    #[serde(rename_all = "camelCase")]
    Complete {
        /// Public URL of the archive
        download_url: String,
        /// Suggested filename for the download
        filename: String,
    },
    /// More than one archive was produced
    #[serde(rename_all = "camelCase")]
    CompleteMultipart {
        /// Every archive in part order
        parts: Vec<ArchiveArtifact>,
        /// Number of archives
        total_parts: usize,
    },
}

impl ProgressEvent {
    /// Whether this event ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Error { .. }
                | ProgressEvent::Complete { .. }
                | ProgressEvent::CompleteMultipart { .. }
        )
    }

    /// Phase tag if this is a `progress` event
    pub fn phase(&self) -> Option<Phase> {
        match self {
            ProgressEvent::Progress { phase, .. } => Some(*phase),
            _ => None,
        }
    }
}
