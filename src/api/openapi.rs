//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the reelzip REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the reelzip REST API
///
/// The spec can be accessed via:
/// - `/api/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "reelzip REST API",
        version = "0.1.0",
        description = "Store collections of remote video links and bundle them into size-bounded zip archives with live progress",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Collections
        crate::api::routes::create_collection,
        crate::api::routes::get_collection,

        // Archives
        crate::api::routes::zip_progress,

        // Proxy
        crate::api::routes::proxy_download,

        // Media
        crate::api::routes::resolve_link,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::CollectionId,
        crate::types::ItemRef,
        crate::types::Collection,

        // Progress payload types
        crate::pipeline::Phase,
        crate::pipeline::ArchiveArtifact,

        // Config types from config.rs
        crate::config::Config,
        crate::config::StorageConfig,
        crate::config::ArchiveConfig,
        crate::config::ArchiveCompression,
        crate::config::RetentionConfig,
        crate::config::PersistenceConfig,
        crate::config::ServerIntegrationConfig,
        crate::config::ApiConfig,
        crate::config::ToolsConfig,

        // Link resolution types
        crate::media::DirectLink,
        crate::media::MediaInfo,
        crate::media::MediaFormat,

        // API request/response types
        crate::api::routes::CreateCollectionRequest,
        crate::api::routes::CreateCollectionResponse,
        crate::api::routes::ProxyQuery,
        crate::api::routes::ResolveLinkRequest,
        crate::api::routes::ResolveAction,

        // Error types from error.rs
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "collections", description = "Collections - Store and read ordered lists of remote video links"),
        (name = "archives", description = "Archives - Build zip archives for a collection and stream progress"),
        (name = "proxy", description = "Proxy - Stream a single remote file as a download"),
        (name = "media", description = "Media - Resolve video page links with yt-dlp"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec"),
    )
)]
pub struct ApiDoc;
