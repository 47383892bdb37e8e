//! Template catalog routes.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use super::error::{ApiError, ok};
use crate::services::template::{self, NewTemplate, TemplateCategory, TemplatePatch};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListTemplatesQuery {
    pub category: Option<String>,
}

/// `GET /api/templates?category=academic`
pub async fn list_templates(
    State(state): State<AppState>,
    query: Result<Query<ListTemplatesQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let category = match query.category.as_deref() {
        None | Some("") => None,
        Some(raw) => Some(
            TemplateCategory::from_str(raw).ok_or_else(|| ApiError::BadRequest(format!("Unknown category: {raw}")))?,
        ),
    };

    let templates = template::list_templates(&state, category).await;
    Ok(Json(json!({ "success": true, "templates": templates })))
}

/// `POST /api/templates` — add a user template under a fresh id.
pub async fn create_template(
    State(state): State<AppState>,
    payload: Result<Json<NewTemplate>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(new) = payload?;
    if new.name.trim().is_empty() || new.typst_code.is_empty() {
        return Err(ApiError::bad_request("Name and typstCode are required"));
    }

    let created = template::create_template(&state, new).await;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "template": created }))))
}

/// `GET /api/templates/{id}`
pub async fn get_template(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let found = template::get_template(&state, &id).await?;
    Ok(Json(json!({ "success": true, "template": found })))
}

/// `PATCH /api/templates/{id}`
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<TemplatePatch>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(patch) = payload?;
    let updated = template::update_template(&state, &id, patch).await?;
    Ok(Json(json!({ "success": true, "template": updated })))
}

/// `DELETE /api/templates/{id}`
pub async fn delete_template(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    template::delete_template(&state, &id).await?;
    Ok(ok())
}

#[cfg(test)]
#[path = "templates_test.rs"]
mod tests;
