//! Page link resolution handler.

use super::{ResolveAction, ResolveLinkRequest};
use super::collections::validate_remote_url;
use crate::api::AppState;
use crate::error::{Error, Result};
use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};

/// POST /api/ytdlp - Resolve a video page link
///
/// With the default action the response is a [`DirectLink`](crate::media::DirectLink)
/// ready to go into a collection. With `"action": "info"` it is
/// [`MediaInfo`](crate::media::MediaInfo) describing the video instead.
#[utoipa::path(
    post,
    path = "/api/ytdlp",
    tag = "media",
    request_body = ResolveLinkRequest,
    responses(
        (status = 200, description = "Direct link, or media info when action is \"info\"", body = crate::media::DirectLink),
        (status = 400, description = "Missing or invalid url", body = crate::error::ApiError),
        (status = 501, description = "yt-dlp is not available", body = crate::error::ApiError),
        (status = 503, description = "yt-dlp failed or timed out", body = crate::error::ApiError)
    )
)]
pub async fn resolve_link(
    State(state): State<AppState>,
    Json(request): Json<ResolveLinkRequest>,
) -> Result<Response> {
    let raw_url = request
        .url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| Error::Validation("url is required".to_string()))?;
    let url = validate_remote_url(raw_url)?;

    match request.action {
        ResolveAction::Resolve => Ok(Json(state.links.resolve(&url).await?).into_response()),
        ResolveAction::Info => Ok(Json(state.links.info(&url).await?).into_response()),
    }
}
