//! # reelzip
//!
//! Bundle collections of remotely hosted video files into size-bounded zip
//! archives, streaming live progress to the client.
//!
//! ## Overview
//!
//! - A client stores a [`Collection`](types::Collection) of remote URLs
//! - Requesting the collection as a zip runs the [`ArchivePipeline`]: sizes
//!   are looked up, items are grouped into parts under a configured ceiling, and
//!   each part is streamed straight from the remote hosts into a zip file
//! - Progress arrives as server-sent events; failed items become warnings
//!   and never abort the run
//! - A background sweep deletes expired archives and collections
//! - Links to video pages can be resolved to direct file URLs with yt-dlp
//!
//! ## Quick Start
//!
//! ```no_run
//! use reelzip::{Config, Service};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = Service::new(Config::default()).await?;
//!
//!     // Serve until SIGINT/SIGTERM
//!     reelzip::run_with_shutdown(service).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Page link resolution through yt-dlp
pub mod media;
/// Collection to zip archive pipeline
pub mod pipeline;
/// Expiry of archives and collections
pub mod retention;
/// Service wiring and lifecycle
pub mod service;
/// Core types
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use db::{CollectionStore, Database};
pub use error::{ApiError, ArchiveError, DatabaseError, Error, ErrorDetail, Result, ToHttpStatus};
pub use media::{DirectLink, LinkResolver, MediaInfo};
pub use pipeline::{ArchiveArtifact, ArchivePipeline, Phase, ProgressEvent, RunOutcome};
pub use retention::{RetentionSweeper, SweepReport};
pub use service::Service;
pub use types::{Collection, CollectionId, ItemRef};

/// Bind the configured address and serve until a termination signal arrives.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// The retention sweep runs for the lifetime of the server; on shutdown it
/// is cancelled and the database is closed.
pub async fn run_with_shutdown(service: Service) -> Result<()> {
    let bind_address = service.config().server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .map_err(Error::Io)?;

    service.run(listener, wait_for_signal()).await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
