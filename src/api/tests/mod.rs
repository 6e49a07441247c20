use super::*;
use crate::Config;
use crate::db::{CollectionStore, Database};
use crate::media::{LinkResolver, NoOpLinkResolver};
use crate::pipeline::ArchivePipeline;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

mod proxy;

/// Router plus the state and directories behind it
struct TestApp {
    router: Router,
    state: AppState,
    temp_dir: TempDir,
}

impl TestApp {
    fn download_dir(&self) -> std::path::PathBuf {
        self.state.config.storage.download_dir.clone()
    }

    async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str) -> axum::response::Response {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }
}

async fn test_app() -> TestApp {
    test_app_with(|_| {}).await
}

/// Build an app over a temp directory; `configure` runs before anything is wired
async fn test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    test_app_with_links(configure, Arc::new(NoOpLinkResolver)).await
}

async fn test_app_with_links(
    configure: impl FnOnce(&mut Config),
    links: Arc<dyn LinkResolver>,
) -> TestApp {
    let temp_dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.storage.download_dir = temp_dir.path().join("downloads");
    config.persistence.database_path = temp_dir.path().join("reelzip.db");
    config.server.api.static_dir = temp_dir.path().join("static");
    configure(&mut config);

    std::fs::create_dir_all(&config.storage.download_dir).unwrap();
    std::fs::create_dir_all(&config.server.api.static_dir).unwrap();
    std::fs::write(
        config.server.api.static_dir.join("d.html"),
        "<html><body>download page</body></html>",
    )
    .unwrap();
    std::fs::write(
        config.server.api.static_dir.join("index.html"),
        "<html><body>home</body></html>",
    )
    .unwrap();

    let store: Arc<dyn CollectionStore> =
        Arc::new(Database::new(&config.persistence.database_path).await.unwrap());
    let http = reqwest::Client::new();
    let pipeline = ArchivePipeline::from_config(store.clone(), http.clone(), &config);
    let state = AppState::new(store, pipeline, http, links, Arc::new(config));

    TestApp {
        router: create_router(state.clone()),
        state,
        temp_dir,
    }
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app().await;

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_openapi_endpoint() {
    let app = test_app().await;

    let response = app.get("/api/openapi.json").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["info"]["title"], "reelzip REST API");
    assert!(json["paths"]["/api/zip/{id}"].is_object());
}

#[tokio::test]
async fn test_swagger_ui_can_be_disabled() {
    let enabled = test_app().await;
    assert_ne!(
        enabled.get("/api-docs/openapi.json").await.status(),
        StatusCode::NOT_FOUND
    );

    let disabled = test_app_with(|c| c.server.api.swagger_ui = false).await;
    assert_eq!(
        disabled.get("/api-docs/openapi.json").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_cors_enabled() {
    let app = test_app().await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_restricted_origins() {
    let app = test_app_with(|c| {
        c.server.api.cors_origins = vec!["https://allowed.example".to_string()];
    })
    .await;

    let allowed = Request::builder()
        .uri("/health")
        .header("Origin", "https://allowed.example")
        .body(Body::empty())
        .unwrap();
    let response = app.send(allowed).await;
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://allowed.example"
    );

    let other = Request::builder()
        .uri("/health")
        .header("Origin", "https://other.example")
        .body(Body::empty())
        .unwrap();
    let response = app.send(other).await;
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let app = test_app_with(|c| c.server.api.cors_enabled = false).await;

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should not be present when CORS is disabled"
    );
}

#[tokio::test]
async fn test_download_page_served_for_any_id() {
    let app = test_app().await;

    let response = app.get("/d/ab12cd34").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("download page"));
}

#[tokio::test]
async fn test_static_fallback() {
    let app = test_app().await;

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("home"));

    assert_eq!(app.get("/missing.js").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_archives_served_with_range_support() {
    let app = test_app().await;
    std::fs::write(app.download_dir().join("abc_part1.zip"), b"0123456789").unwrap();

    let full = app.get("/downloads/abc_part1.zip").await;
    assert_eq!(full.status(), StatusCode::OK);
    assert_eq!(body_bytes(full).await, b"0123456789");

    let request = Request::builder()
        .uri("/downloads/abc_part1.zip")
        .header("Range", "bytes=2-5")
        .body(Body::empty())
        .unwrap();
    let partial = app.send(request).await;
    assert_eq!(partial.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(body_bytes(partial).await, b"2345");
}

#[tokio::test]
async fn test_body_limit() {
    let app = test_app_with(|c| c.server.api.body_limit_bytes = 64).await;

    let links: Vec<String> = (0..20)
        .map(|i| format!("https://cdn.test/{i}.mp4"))
        .collect();
    let request = Request::builder()
        .method("POST")
        .uri("/api/collection")
        .header("content-type", "application/json")
        .body(Body::from(serde_json::json!({ "links": links }).to_string()))
        .unwrap();

    let response = app.send(request).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_api_server_stops_on_shutdown_signal() {
    let app = test_app().await;
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let handle = tokio::spawn(start_api_server(listener, app.state.clone(), async move {
        let _ = stop_rx.await;
    }));

    let response = reqwest::get(format!("http://{address}/health")).await.unwrap();
    assert!(response.status().is_success());

    stop_tx.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server should stop after the shutdown signal")
        .unwrap()
        .unwrap();

    drop(app.temp_dir);
}
