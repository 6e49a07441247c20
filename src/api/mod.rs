//! REST API server module
//!
//! Provides the HTTP surface: collection storage, the archive progress
//! stream, the single-file proxy, page link resolution and static file
//! serving.

use crate::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
};
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Collections
/// - `POST /api/collection` - Store a collection from items or bare links
/// - `GET /api/collection/:id` - Get a stored collection
///
/// ## Archives
/// - `GET /api/zip/:id` - Build archives for a collection (server-sent events)
///
/// ## Proxy
/// - `GET /api/download?url=&filename=` - Stream one remote file as an attachment
///
/// ## Media
/// - `POST /api/ytdlp` - Resolve a video page link to a direct file URL (or describe it)
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /api/openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
///
/// ## Static
/// - `GET <public_path>/*` - Finished archives (range requests supported)
/// - `GET /d/:id` - Collection download page
/// - everything else - Files from the static directory
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();
    let api = &config.server.api;

    let router = Router::new()
        // Collections
        .route("/api/collection", post(routes::create_collection))
        .route("/api/collection/:id", get(routes::get_collection))
        // Archives
        .route("/api/zip/:id", get(routes::zip_progress))
        // Proxy
        .route("/api/download", get(routes::proxy_download))
        // Media links
        .route("/api/ytdlp", post(routes::resolve_link))
        // System
        .route("/health", get(routes::health_check))
        .route("/api/openapi.json", get(routes::openapi_spec));

    // SwaggerUi serves its own copy of the document; the path must not collide with ours
    let router = if api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router
        .with_state(state)
        .nest_service(
            &config.storage.public_path,
            ServeDir::new(&config.storage.download_dir),
        )
        .route_service("/d/:id", ServeFile::new(api.static_dir.join("d.html")))
        .fallback_service(ServeDir::new(&api.static_dir))
        .layer(DefaultBodyLimit::max(api.body_limit_bytes))
        .layer(TraceLayer::new_for_http());

    // Apply CORS middleware if enabled in config
    if api.cors_enabled {
        router.layer(build_cors_layer(&api.cors_origins))
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins
///
/// `"*"` anywhere in the list (or an empty list) allows any origin.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Serve the API on an already bound listener until `shutdown` resolves
///
/// In-flight requests (including open progress streams) are allowed to
/// finish once shutdown starts.
pub async fn start_api_server<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let address = listener.local_addr().map_err(crate::error::Error::Io)?;
    let app = create_router(state);

    tracing::info!(address = %address, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
