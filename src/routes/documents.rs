//! Document store routes.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::error::{ApiError, ok};
use crate::services::document;
use crate::state::{AppState, Selection};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentBody {
    pub title: Option<String>,
    pub template_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContentBody {
    pub content: Option<String>,
}

/// Absent fields are left untouched; `selection: null` clears the selection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEditorBody {
    pub cursor_position: Option<usize>,
    #[serde(default, deserialize_with = "crate::services::nullable")]
    pub selection: Option<Option<Selection>>,
}

/// `GET /api/documents`
pub async fn list_documents(State(state): State<AppState>) -> Json<Value> {
    let documents = document::list_documents(&state).await;
    Json(json!({ "success": true, "documents": documents }))
}

/// `POST /api/documents` — create, optionally seeded from a template.
pub async fn create_document(
    State(state): State<AppState>,
    payload: Result<Json<CreateDocumentBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = payload?;
    let title = body
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Title is required"))?;

    let entry = document::create_document(&state, &title, body.template_id).await;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "document": entry }))))
}

/// `GET /api/documents/{id}`
pub async fn get_document(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = id?;
    let entry = document::get_document(&state, id).await?;
    Ok(Json(json!({ "success": true, "document": entry })))
}

/// `DELETE /api/documents/{id}`
pub async fn delete_document(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = id?;
    document::delete_document(&state, id).await?;
    Ok(ok())
}

/// `PUT /api/documents/{id}/content` — replace the content wholesale.
pub async fn update_content(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateContentBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = id?;
    let Json(body) = payload?;
    // Empty content is a legitimate edit; only a missing field is rejected.
    let content = body.content.ok_or_else(|| ApiError::bad_request("Content is required"))?;

    let entry = document::update_content(&state, id, content).await?;
    Ok(Json(json!({ "success": true, "document": entry })))
}

/// `PATCH /api/documents/{id}/editor`
pub async fn update_editor(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateEditorBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = id?;
    let Json(body) = payload?;
    if let Some(Some(Selection { from, to })) = body.selection {
        if from > to {
            return Err(ApiError::bad_request("Selection start must not exceed its end"));
        }
    }

    let editor = document::update_editor(&state, id, body.cursor_position, body.selection).await?;
    Ok(Json(json!({ "success": true, "editor": editor })))
}

/// `POST /api/documents/{id}/save` — clear the dirty flag.
pub async fn save_document(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, ApiError> {
    let Path(id) = id?;
    let entry = document::save_document(&state, id).await?;
    Ok(Json(json!({ "success": true, "document": entry })))
}

#[cfg(test)]
#[path = "documents_test.rs"]
mod tests;
