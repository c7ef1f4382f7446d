use crate::error::{AppError, EMPTY_MESSAGE};
use crate::state::AppState;
use axum::{Json, extract::State};
use fix_codec::{decode_ordered, normalize};
use fix_types::ids::StreamEntryId;
use fix_types::tags::display_name;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub status: &'static str,
    pub transport_id: StreamEntryId,
    /// Dictionary name → value, in the order tags first appear
    pub parsed: Map<String, Value>,
}

/// Trim, and drop one pair of surrounding quotes left by JSON clients.
fn unwrap_body(body: &str) -> &str {
    let trimmed = body.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
}

pub async fn parse_message(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ParseResponse>, AppError> {
    let message = unwrap_body(&body);
    if message.trim().is_empty() {
        return Err(AppError::Rejected(EMPTY_MESSAGE.to_string()));
    }

    let message = normalize(message);
    let transport_id = state.transport.publish(message.as_bytes()).await?;
    tracing::info!(id = %transport_id, bytes = message.len(), "FIX message queued");

    let parsed = decode_ordered(&message)
        .iter()
        .map(|(tag, value)| (display_name(tag), Value::String(value.to_string())))
        .collect();

    Ok(Json(ParseResponse {
        status: "queued",
        transport_id,
        parsed,
    }))
}
