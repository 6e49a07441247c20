use super::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_proxy_streams_body_and_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clip.webm"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "video/webm")
                .set_body_bytes(b"webm-bytes".to_vec()),
        )
        .mount(&server)
        .await;

    let app = test_app().await;
    let url = urlencoding::encode(&format!("{}/clip.webm", server.uri())).into_owned();
    let response = app
        .get(&format!("/api/download?url={url}&filename=My%20Clip.webm"))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "video/webm");
    assert_eq!(response.headers()["content-length"], "10");
    let disposition = response.headers()["content-disposition"].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"My Clip.webm\""));
    assert_eq!(body_bytes(response).await, b"webm-bytes");

    // Nothing is persisted
    assert_eq!(std::fs::read_dir(app.download_dir()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_proxy_defaults_filename_and_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/raw"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"raw".to_vec()))
        .mount(&server)
        .await;

    let app = test_app().await;
    let url = urlencoding::encode(&format!("{}/raw", server.uri())).into_owned();
    let response = app.get(&format!("/api/download?url={url}")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );
    let disposition = response.headers()["content-disposition"].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"video.mp4\""));
}

#[tokio::test]
async fn test_proxy_sanitizes_filename() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"x".to_vec()))
        .mount(&server)
        .await;

    let app = test_app().await;
    let url = urlencoding::encode(&format!("{}/x", server.uri())).into_owned();
    let filename = urlencoding::encode("../a\"b.mp4").into_owned();
    let response = app
        .get(&format!("/api/download?url={url}&filename={filename}"))
        .await;

    let disposition = response.headers()["content-disposition"].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\".._a_b.mp4\""));
}

#[tokio::test]
async fn test_proxy_requires_url() {
    let app = test_app().await;

    for uri in ["/api/download", "/api/download?url=", "/api/download?url=ftp%3A%2F%2Fx%2Fa"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn test_proxy_upstream_error_is_502() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let app = test_app().await;
    let url = urlencoding::encode(&format!("{}/gone.mp4", server.uri())).into_owned();
    let response = app.get(&format!("/api/download?url={url}")).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "upstream_error");
    assert!(json["error"]["message"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_proxy_unreachable_upstream_is_502() {
    let app = test_app().await;
    let url = urlencoding::encode("http://127.0.0.1:1/a.mp4").into_owned();

    let response = app.get(&format!("/api/download?url={url}")).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["error"]["code"], "network_error");
}
