//! Application state for the API server

use crate::Config;
use crate::db::CollectionStore;
use crate::media::LinkResolver;
use crate::pipeline::ArchivePipeline;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the collection store, the archive pipeline, the link resolver
/// and configuration.
#[derive(Clone)]
pub struct AppState {
    /// Collection storage
    pub store: Arc<dyn CollectionStore>,

    /// Archive pipeline driven by `GET /api/zip/:id`
    pub pipeline: ArchivePipeline,

    /// Shared HTTP client for the download proxy
    pub http: reqwest::Client,

    /// Page link resolver behind `POST /api/ytdlp`
    pub links: Arc<dyn LinkResolver>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(
        store: Arc<dyn CollectionStore>,
        pipeline: ArchivePipeline,
        http: reqwest::Client,
        links: Arc<dyn LinkResolver>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            store,
            pipeline,
            http,
            links,
            config,
        }
    }
}
