use crate::error::AppError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use fix_types::ids::StreamEntryId;
use std::time::Duration;
use stream::wire::{
    DEFAULT_READ_COUNT, MAX_BLOCK_MS, PublishResponse, ReadQuery, ReadResponse, WireEntry,
};

pub async fn publish_entry(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<PublishResponse>, AppError> {
    let id = state.transport.publish(body.as_bytes()).await?;
    Ok(Json(PublishResponse { id }))
}

pub async fn read_entries(
    State(state): State<AppState>,
    Query(query): Query<ReadQuery>,
) -> Result<Json<ReadResponse>, AppError> {
    let after = match query.after.as_deref() {
        None => StreamEntryId::START,
        Some(text) => text
            .parse::<StreamEntryId>()
            .map_err(|e| AppError::BadRequest(format!("invalid after id {:?}: {}", text, e)))?,
    };
    let count = query.count.unwrap_or(DEFAULT_READ_COUNT);
    let block = Duration::from_millis(query.block_ms.unwrap_or(0).min(MAX_BLOCK_MS));

    let entries = state.transport.read(after, count, block).await?;
    let entries = entries
        .iter()
        .map(WireEntry::from_entry)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ReadResponse { entries }))
}
