//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`collections`] - Creating and reading collections
//! - [`archive`] - Archive pipeline progress stream
//! - [`proxy`] - Single-file download passthrough
//! - [`media`] - Resolving video page links
//! - [`system`] - Health, OpenAPI

use crate::types::{CollectionId, ItemRef};
use serde::{Deserialize, Serialize};

mod archive;
mod collections;
mod media;
mod proxy;
mod system;

// Re-export all handlers so `routes::function_name` works
pub use archive::*;
pub use collections::*;
pub use media::*;
pub use proxy::*;
pub use system::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Request body for POST /api/collection
///
/// Either `items` (explicit url + filename pairs) or `links` (bare URLs whose
/// filename is derived from the path) may be given. `items` wins when both are present.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreateCollectionRequest {
    /// Explicit items
    #[serde(default)]
    pub items: Vec<ItemRef>,
    /// Bare links
    #[serde(default)]
    pub links: Vec<String>,
}

/// Response for POST /api/collection
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct CreateCollectionResponse {
    /// New collection id
    pub id: CollectionId,
    /// Path of the download page for this collection
    pub url: String,
    /// Number of items stored
    pub count: usize,
}

/// Query parameters for GET /api/download
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema, utoipa::IntoParams)]
pub struct ProxyQuery {
    /// Remote URL to stream
    pub url: Option<String>,
    /// Filename offered to the browser (default: video.mp4)
    pub filename: Option<String>,
}

/// Request body for POST /api/ytdlp
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct ResolveLinkRequest {
    /// Link to a video page
    pub url: Option<String>,
    /// What to return (default: resolve)
    #[serde(default)]
    pub action: ResolveAction,
}

/// What POST /api/ytdlp returns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResolveAction {
    /// A direct file URL and filename
    #[default]
    Resolve,
    /// Title, duration, thumbnail and formats
    Info,
}
