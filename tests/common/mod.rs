//! Common test utilities for reelzip end-to-end tests

use reelzip::{Config, ProgressEvent, Service};
use std::net::SocketAddr;
use tempfile::TempDir;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A running service bound to an ephemeral port
pub struct RunningService {
    pub address: SocketAddr,
    pub temp_dir: TempDir,
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<reelzip::Result<()>>>,
}

impl RunningService {
    /// Start a service over a fresh temp directory; `configure` may adjust the config
    pub async fn start(configure: impl FnOnce(&mut Config)) -> Self {
        let temp_dir = TempDir::new().unwrap();

        let mut config = Config::default();
        config.storage.download_dir = temp_dir.path().join("downloads");
        config.persistence.database_path = temp_dir.path().join("reelzip.db");
        config.server.api.static_dir = temp_dir.path().join("static");
        config.server.api.swagger_ui = false;
        configure(&mut config);

        std::fs::create_dir_all(&config.server.api.static_dir).unwrap();
        std::fs::write(
            config.server.api.static_dir.join("d.html"),
            "<html>download page</html>",
        )
        .unwrap();

        let service = Service::new(config).await.unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(service.run(listener, async move {
            let _ = stop_rx.await;
        }));

        Self {
            address,
            temp_dir,
            stop: Some(stop_tx),
            handle: Some(handle),
        }
    }

    /// Absolute URL for a path on this service
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.address, path)
    }

    /// Directory archives are written to
    pub fn download_dir(&self) -> std::path::PathBuf {
        self.temp_dir.path().join("downloads")
    }

    /// Send the shutdown signal and wait for the service to finish
    pub async fn stop(mut self) -> reelzip::Result<()> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        match self.handle.take() {
            Some(handle) => handle.await.unwrap(),
            None => Ok(()),
        }
    }
}

/// Serve `body` at `/<name>` for both GET and HEAD
pub async fn serve_file(server: &MockServer, name: &str, body: &[u8]) {
    for verb in ["GET", "HEAD"] {
        Mock::given(method(verb))
            .and(path(format!("/{name}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "video/mp4")
                    .insert_header("content-length", body.len().to_string())
                    .set_body_bytes(body.to_vec()),
            )
            .mount(server)
            .await;
    }
}

/// Parse the `data:` lines of an SSE body
pub fn parse_events(body: &str) -> Vec<ProgressEvent> {
    body.lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| serde_json::from_str(data.trim_start()).unwrap())
        .collect()
}
