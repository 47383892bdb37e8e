//! `POST /api/highlight` — tokenize markup into editor highlight spans.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;
use serde_json::{Value, json};

use super::error::ApiError;
use crate::services::highlight;

#[derive(Debug, Deserialize)]
pub struct HighlightBody {
    pub content: Option<String>,
}

pub async fn tokenize(payload: Result<Json<HighlightBody>, JsonRejection>) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let content = body.content.ok_or_else(|| ApiError::bad_request("Content is required"))?;
    let spans = highlight::highlight(&content);
    Ok(Json(json!({ "success": true, "spans": spans })))
}
