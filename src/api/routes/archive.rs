//! Archive pipeline progress stream.

use crate::api::AppState;
use crate::error::Result;
use crate::pipeline::{ChannelSink, RunOutcome};
use crate::types::CollectionId;
use axum::{
    extract::{Path, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
};
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

/// Events buffered between the pipeline task and a slow client
const PROGRESS_BUFFER: usize = 64;

/// GET /api/zip/:id - Build archives for a collection, streaming progress
///
/// Every event is sent as a single `data:` line holding the JSON-encoded
/// progress event. The stream ends after the terminal event. Closing the
/// connection early stops the run.
#[utoipa::path(
    get,
    path = "/api/zip/{id}",
    tag = "archives",
    params(
        ("id" = String, Path, description = "Collection ID")
    ),
    responses(
        (status = 200, description = "Progress events (text/event-stream)", content_type = "text/event-stream"),
        (status = 400, description = "Malformed collection ID", body = crate::error::ApiError)
    )
)]
pub async fn zip_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl tokio_stream::Stream<Item = std::result::Result<SseEvent, Infallible>>>> {
    let id = CollectionId::parse(&id)?;
    let (sink, receiver) = ChannelSink::channel(PROGRESS_BUFFER);

    let pipeline = state.pipeline.clone();
    tokio::spawn(async move {
        match pipeline.run(&id, &sink).await {
            RunOutcome::Completed(parts) => {
                tracing::debug!(collection_id = %id, parts = parts.len(), "Archive stream finished");
            }
            RunOutcome::Failed(message) => {
                tracing::debug!(collection_id = %id, %message, "Archive stream ended with error");
            }
            RunOutcome::Abandoned => {}
        }
        // Dropping the sink closes the stream
    });

    let stream = ReceiverStream::new(receiver).filter_map(|event| {
        match SseEvent::default().json_data(&event) {
            Ok(sse_event) => Some(Ok(sse_event)),
            Err(e) => {
                tracing::warn!("Failed to serialize progress event to JSON: {}", e);
                None
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
