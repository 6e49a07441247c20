//! Service wiring and lifecycle.

use crate::api::{self, AppState};
use crate::config::Config;
use crate::db::{CollectionStore, Database};
use crate::error::{Error, Result};
use crate::media::{self, LinkResolver};
use crate::pipeline::ArchivePipeline;
use crate::retention::RetentionSweeper;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Time allowed to establish a connection to a remote file host
const CONNECT_TIMEOUT_SECS: u64 = 30;

/// All long-lived resources of a running archive service
///
/// Built once at startup and torn down by [`Service::shutdown`].
pub struct Service {
    config: Arc<Config>,
    db: Arc<Database>,
    http: reqwest::Client,
    pipeline: ArchivePipeline,
    links: Arc<dyn LinkResolver>,
    cancel_token: CancellationToken,
}

impl Service {
    /// Create the download directory, open the database and wire the pipeline
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid, the download directory cannot
    /// be created, or the database cannot be opened.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.storage.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.storage.download_dir.display(),
                        e
                    ),
                ))
            })?;

        let db = Arc::new(Database::new(&config.persistence.database_path).await?);

        // No overall timeout: bodies of large videos can stream for a long time
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(concat!("reelzip/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                Error::Io(std::io::Error::other(format!(
                    "Failed to create HTTP client: {}",
                    e
                )))
            })?;

        let store: Arc<dyn CollectionStore> = db.clone();
        let pipeline = ArchivePipeline::from_config(store, http.clone(), &config);
        let links = media::resolver_from_config(&config.tools);

        tracing::info!(
            download_dir = ?config.storage.download_dir,
            database = ?config.persistence.database_path,
            part_ceiling = config.archive.part_ceiling_bytes,
            "Service initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            db,
            http,
            pipeline,
            links,
            cancel_token: CancellationToken::new(),
        })
    }

    /// Configuration the service was built with
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Handler state shared by every request
    pub fn state(&self) -> AppState {
        AppState::new(
            self.db.clone(),
            self.pipeline.clone(),
            self.http.clone(),
            self.links.clone(),
            self.config.clone(),
        )
    }

    /// Start the periodic retention sweep; it stops on [`Service::shutdown`]
    pub fn spawn_retention_sweep(&self) -> tokio::task::JoinHandle<()> {
        RetentionSweeper::new(
            self.db.clone(),
            self.config.storage.download_dir.clone(),
            self.config.retention.clone(),
        )
        .spawn(self.cancel_token.child_token())
    }

    /// Serve HTTP on `listener` with the retention sweep running, until `shutdown` resolves
    ///
    /// The sweep is stopped and the database closed before this returns,
    /// whether the server ended cleanly or not.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sweep = self.spawn_retention_sweep();
        let result = api::start_api_server(listener, self.state(), shutdown).await;

        self.shutdown().await;
        if let Err(e) = sweep.await {
            tracing::warn!(error = %e, "Retention sweep task ended abnormally");
        }

        result
    }

    /// Stop background work and close the database
    pub async fn shutdown(&self) {
        tracing::info!("Initiating graceful shutdown");
        self.cancel_token.cancel();
        self.db.close().await;
        tracing::info!("Shutdown complete");
    }
}
