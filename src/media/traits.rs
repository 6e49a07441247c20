//! Link resolution trait and the types it returns

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A page link turned into a file that can be fetched directly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DirectLink {
    /// URL of the media file itself
    pub direct_url: String,
    /// Filename suggested for the file, already sanitized
    pub filename: String,
    /// Link the client asked about
    pub original_url: String,
}

/// Metadata about the media behind a page link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MediaInfo {
    /// Title of the video
    pub title: Option<String>,
    /// Length in seconds
    pub duration: Option<f64>,
    /// Thumbnail image URL
    pub thumbnail: Option<String>,
    /// First few formats on offer
    pub formats: Vec<MediaFormat>,
}

/// One downloadable format of a video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MediaFormat {
    /// Extractor format id
    pub format_id: String,
    /// Container extension
    pub ext: Option<String>,
    /// e.g. "1280x720" or "audio only"
    pub resolution: Option<String>,
    /// Exact size in bytes, when the site reports it
    pub filesize: Option<u64>,
}

/// Turns links to video pages into direct file URLs
///
/// The API holds one of these behind an `Arc<dyn LinkResolver>` so the
/// yt-dlp backed implementation can be swapped for [`NoOpLinkResolver`]
/// (or a test double) without touching the handlers.
///
/// [`NoOpLinkResolver`]: super::NoOpLinkResolver
#[async_trait]
pub trait LinkResolver: Send + Sync {
    /// Resolve `url` to a direct media URL and a filename
    async fn resolve(&self, url: &str) -> crate::Result<DirectLink>;

    /// Describe the media behind `url` without resolving a download
    async fn info(&self, url: &str) -> crate::Result<MediaInfo>;

    /// Name of this resolver for logging
    fn name(&self) -> &'static str;
}
