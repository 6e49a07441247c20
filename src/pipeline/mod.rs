//! Collection → zip archive pipeline, split into focused submodules.
//!
//! A run is driven by [`ArchivePipeline::run`] and moves through these steps:
//! - [`size`] - Estimate every item's size without downloading it
//! - [`partition`] - Group items into consecutive, size-bounded parts
//! - [`archive`] - Stream each part's items into one zip file
//! - [`events`] - Progress events describing every step
//! - [`sink`] - Where those events are delivered
//! - [`orchestrator`] - The run state machine tying the above together

pub mod archive;
pub mod events;
mod orchestrator;
pub mod partition;
pub mod sink;
pub mod size;

pub use archive::{ArchiveSummary, ArchiveWriter, PartProgress};
pub use events::{ArchiveArtifact, Phase, ProgressEvent};
pub use orchestrator::RunOutcome;
pub use partition::{PartGroup, ResolvedItem, partition};
pub use sink::{ChannelSink, MemorySink, ProgressSink};
pub use size::{HttpSizeResolver, SizeResolver};

use crate::config::Config;
use crate::db::CollectionStore;
use std::path::PathBuf;
use std::sync::Arc;

/// Storage and packing settings for archive runs
#[derive(Clone, Debug)]
pub struct PipelineSettings {
    /// Directory archives are written into
    pub download_dir: PathBuf,
    /// URL prefix archives are served under
    pub public_path: String,
    /// Target maximum estimated size per part
    pub part_ceiling_bytes: u64,
}

impl PipelineSettings {
    /// Extract the pipeline settings from the service configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            download_dir: config.storage.download_dir.clone(),
            public_path: config.storage.public_path.clone(),
            part_ceiling_bytes: config.archive.part_ceiling_bytes,
        }
    }
}

/// Builds size-bounded zip archives for stored collections (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct ArchivePipeline {
    /// Where collections are looked up
    pub(crate) store: Arc<dyn CollectionStore>,
    /// Size estimation for packing
    pub(crate) resolver: Arc<dyn SizeResolver>,
    /// Fetches bodies and writes archives
    pub(crate) writer: ArchiveWriter,
    /// Storage and packing settings
    pub(crate) settings: Arc<PipelineSettings>,
}

impl ArchivePipeline {
    /// Assemble a pipeline from explicit collaborators
    pub fn new(
        store: Arc<dyn CollectionStore>,
        resolver: Arc<dyn SizeResolver>,
        writer: ArchiveWriter,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            resolver,
            writer,
            settings: Arc::new(settings),
        }
    }

    /// Build the production pipeline: HEAD-based size lookups and HTTP body fetches over `client`
    pub fn from_config(
        store: Arc<dyn CollectionStore>,
        client: reqwest::Client,
        config: &Config,
    ) -> Self {
        let resolver = Arc::new(HttpSizeResolver::new(
            client.clone(),
            config.archive.fallback_size_bytes,
        ));
        let writer = ArchiveWriter::new(client, config.archive.compression.method());

        Self::new(store, resolver, writer, PipelineSettings::from_config(config))
    }

    /// Settings this pipeline was built with
    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }
}
