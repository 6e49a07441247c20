//! Collection handlers.

use super::{CreateCollectionRequest, CreateCollectionResponse};
use crate::api::AppState;
use crate::error::{Error, Result};
use crate::types::{Collection, CollectionId, ItemRef};
use crate::utils::{filename_from_url, sanitize_filename};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

/// POST /api/collection - Store a new collection
#[utoipa::path(
    post,
    path = "/api/collection",
    tag = "collections",
    request_body = CreateCollectionRequest,
    responses(
        (status = 201, description = "Collection stored", body = CreateCollectionResponse),
        (status = 400, description = "No usable items in the request", body = crate::error::ApiError),
        (status = 500, description = "Internal server error", body = crate::error::ApiError)
    )
)]
pub async fn create_collection(
    State(state): State<AppState>,
    Json(request): Json<CreateCollectionRequest>,
) -> Result<impl IntoResponse> {
    let items = normalize_request(request)?;
    let id = state.store.create(&items).await?;

    tracing::info!(collection_id = %id, items = items.len(), "Collection created");

    Ok((
        StatusCode::CREATED,
        Json(CreateCollectionResponse {
            url: format!("/d/{}", id),
            id,
            count: items.len(),
        }),
    ))
}

/// GET /api/collection/:id - Get a stored collection
#[utoipa::path(
    get,
    path = "/api/collection/{id}",
    tag = "collections",
    params(
        ("id" = String, Path, description = "Collection ID")
    ),
    responses(
        (status = 200, description = "Collection", body = Collection),
        (status = 400, description = "Malformed collection ID", body = crate::error::ApiError),
        (status = 404, description = "Collection not found", body = crate::error::ApiError)
    )
)]
pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Collection>> {
    let id = CollectionId::parse(&id)?;
    let collection = state.store.get(&id).await?;
    Ok(Json(collection))
}

/// Turn the request body into a validated, non-empty item list
pub(crate) fn normalize_request(request: CreateCollectionRequest) -> Result<Vec<ItemRef>> {
    let items = if !request.items.is_empty() {
        request
            .items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let url = validate_remote_url(&item.url)?;
                let filename = match sanitize_filename(&item.filename) {
                    name if name.is_empty() => filename_from_url(&url, index),
                    name => name,
                };
                Ok(ItemRef::new(url, filename))
            })
            .collect::<Result<Vec<_>>>()?
    } else {
        request
            .links
            .iter()
            .map(|link| link.trim())
            .filter(|link| link.starts_with("http://") || link.starts_with("https://"))
            .filter_map(|link| validate_remote_url(link).ok())
            .enumerate()
            .map(|(index, url)| {
                let filename = filename_from_url(&url, index);
                ItemRef::new(url, filename)
            })
            .collect()
    };

    if items.is_empty() {
        return Err(Error::Validation(
            "at least one http(s) link is required".to_string(),
        ));
    }

    Ok(items)
}

/// Accept only absolute http(s) URLs
pub(crate) fn validate_remote_url(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw.trim())
        .map_err(|e| Error::Validation(format!("invalid url '{}': {}", raw, e)))?;

    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(parsed.to_string()),
        _ => Err(Error::Validation(format!(
            "only http and https urls are supported: '{}'",
            raw
        ))),
    }
}
