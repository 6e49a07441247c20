//! Single-file download passthrough.

use super::ProxyQuery;
use super::collections::validate_remote_url;
use crate::api::AppState;
use crate::error::{ApiError, Error, Result};
use crate::utils::{attachment_disposition, sanitize_filename};
use axum::{
    Json,
    body::Body,
    extract::{Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

/// Filename offered when the client gives none
const DEFAULT_FILENAME: &str = "video.mp4";

/// GET /api/download - Stream one remote file back as an attachment
///
/// Nothing is written to disk. Content-Type and Content-Length are forwarded
/// from the upstream response when present.
#[utoipa::path(
    get,
    path = "/api/download",
    tag = "proxy",
    params(ProxyQuery),
    responses(
        (status = 200, description = "Remote file body", content_type = "application/octet-stream"),
        (status = 400, description = "Missing or invalid url", body = crate::error::ApiError),
        (status = 502, description = "Upstream unreachable or returned an error", body = crate::error::ApiError)
    )
)]
pub async fn proxy_download(
    State(state): State<AppState>,
    Query(query): Query<ProxyQuery>,
) -> Result<Response> {
    let raw_url = query
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| Error::Validation("url query parameter is required".to_string()))?;
    let url = validate_remote_url(raw_url)?;

    let upstream = state.http.get(&url).send().await.map_err(|e| {
        tracing::warn!(url = %url, error = %e, "Proxy fetch failed");
        Error::Network(e)
    })?;

    if !upstream.status().is_success() {
        let status = upstream.status().as_u16();
        tracing::warn!(url = %url, status, "Proxy upstream returned non-success");
        return Ok((
            StatusCode::BAD_GATEWAY,
            Json(ApiError::bad_gateway(format!(
                "upstream responded with status {}",
                status
            ))),
        )
            .into_response());
    }

    let filename = query
        .filename
        .as_deref()
        .map(sanitize_filename)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

    // reqwest and axum sit on different `http` versions; copy header bytes across
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| HeaderValue::from_bytes(value.as_bytes()).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));
    let content_length = upstream
        .headers()
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|value| HeaderValue::from_bytes(value.as_bytes()).ok());
    let disposition = HeaderValue::from_str(&attachment_disposition(&filename))
        .map_err(|e| Error::Other(format!("invalid content disposition: {}", e)))?;

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Some(length) = content_length {
        headers.insert(header::CONTENT_LENGTH, length);
    }
    headers.insert(header::CONTENT_DISPOSITION, disposition);

    Ok(response)
}
