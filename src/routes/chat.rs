//! Chat-assist routes over the mock responder.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::error::ApiError;
use crate::services::chat;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageBody {
    pub message: Option<String>,
    /// Document to rewrite when the reply carries code.
    pub document_id: Option<Uuid>,
}

/// `GET /api/chat`
pub async fn list_messages(State(state): State<AppState>) -> Json<Value> {
    let messages = chat::list_messages(&state).await;
    Json(json!({ "success": true, "messages": messages }))
}

/// `POST /api/chat` — append a user message and the responder's reply.
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<SendMessageBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let message = body
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Message is required"))?;

    let exchange = chat::send_message(&state, &message, body.document_id).await?;
    Ok(Json(json!({ "success": true, "exchange": exchange })))
}

/// `DELETE /api/chat`
pub async fn clear_messages(State(state): State<AppState>) -> Json<Value> {
    let cleared = chat::clear_messages(&state).await;
    Json(json!({ "success": true, "cleared": cleared }))
}
