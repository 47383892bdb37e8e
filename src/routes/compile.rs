//! Compiler relay routes.
//!
//! Each handler validates its body, awaits the shared compiler handle, and
//! forwards to exactly one [`Compiler`](crate::compiler::Compiler) method.
//! Validation runs before the compiler is touched, so a malformed request
//! is a 400 even while the compiler cannot initialize.

use std::collections::BTreeMap;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::error::{ApiError, ok};
use crate::compiler::{CompileFormat, CompileRequest};
use crate::state::AppState;

pub const DEFAULT_EVICT_MAX_AGE: usize = 10;

/// Longest prefix of the content echoed into the request log.
const LOG_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct CompileBody {
    pub content: Option<String>,
    pub format: Option<String>,
    #[serde(default)]
    pub inputs: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct AddSourceBody {
    pub path: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MapShadowBody {
    pub path: Option<String>,
    /// Base64-encoded file contents.
    pub data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvictCacheBody {
    pub max_age: Option<usize>,
}

/// `POST /api/compile` — compile to PDF bytes or JSON-wrapped SVG text.
pub async fn compile(
    State(state): State<AppState>,
    payload: Result<Json<CompileBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = payload?;
    let content = non_empty(body.content).ok_or_else(|| ApiError::bad_request("Content is required"))?;
    let format = CompileFormat::from_str(body.format.as_deref().unwrap_or("svg"))
        .ok_or_else(|| ApiError::bad_request("Unsupported format. Use: pdf, svg, plainSvg"))?;

    let preview: String = content.chars().take(LOG_PREVIEW_CHARS).collect();
    info!(format = format.as_str(), content_len = content.len(), %preview, "compile: request");

    let request = CompileRequest::new(content).with_inputs(stringify_inputs(body.inputs));
    let compiler = state.compiler.get().await?;

    let response = match format {
        CompileFormat::Pdf => {
            let pdf = compiler.pdf(request).await?;
            (
                [(CONTENT_TYPE, "application/pdf"), (CONTENT_DISPOSITION, "inline; filename=\"document.pdf\"")],
                pdf,
            )
                .into_response()
        }
        CompileFormat::Svg | CompileFormat::PlainSvg => {
            let svg = if format == CompileFormat::Svg {
                compiler.svg(request).await?
            } else {
                compiler.plain_svg(request).await?
            };
            Json(json!({ "success": true, "result": svg, "format": format.as_str() })).into_response()
        }
    };
    Ok(response)
}

/// `POST /api/add-source` — declare an extra source file.
pub async fn add_source(
    State(state): State<AppState>,
    payload: Result<Json<AddSourceBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(body) = payload?;
    let (Some(path), Some(content)) = (non_empty(body.path), non_empty(body.content)) else {
        return Err(ApiError::bad_request("Path and content are required"));
    };

    let compiler = state.compiler.get().await?;
    compiler.add_source(&path, content).await?;
    Ok(ok())
}

/// `POST /api/map-shadow` — map base64 data to a virtual path.
pub async fn map_shadow(
    State(state): State<AppState>,
    payload: Result<Json<MapShadowBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Json(body) = payload?;
    let (Some(path), Some(data)) = (non_empty(body.path), non_empty(body.data)) else {
        return Err(ApiError::bad_request("Path and data are required"));
    };
    // Line-wrapped encoders (e.g. the `base64` CLI) insert newlines.
    let compact: String = data.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| ApiError::BadRequest(format!("Data must be base64: {e}")))?;

    let compiler = state.compiler.get().await?;
    compiler.map_shadow(&path, bytes).await?;
    Ok(ok())
}

/// `POST /api/evict-cache` — body is optional; `maxAge` defaults to 10.
pub async fn evict_cache(State(state): State<AppState>, body: Bytes) -> Result<Json<serde_json::Value>, ApiError> {
    let body: EvictCacheBody = if body.iter().all(u8::is_ascii_whitespace) {
        EvictCacheBody::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
    };

    let compiler = state.compiler.get().await?;
    compiler
        .evict_cache(body.max_age.unwrap_or(DEFAULT_EVICT_MAX_AGE))
        .await?;
    Ok(ok())
}

/// `POST /api/reset-shadow`
pub async fn reset_shadow(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let compiler = state.compiler.get().await?;
    compiler.reset_shadow().await?;
    Ok(ok())
}

/// `GET /api/health` — initializes the compiler if needed and reports readiness.
pub async fn health(State(state): State<AppState>) -> Response {
    match state.compiler.get().await {
        Ok(compiler) => Json(json!({ "success": true, "status": "ready", "compiler": compiler.name() })).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "success": false, "status": "error", "error": e.to_string() })),
        )
            .into_response(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Compiler inputs are strings. Other JSON scalars keep their JSON text; nulls are dropped.
fn stringify_inputs(inputs: serde_json::Map<String, serde_json::Value>) -> BTreeMap<String, String> {
    inputs
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect()
}

#[cfg(test)]
#[path = "compile_test.rs"]
mod tests;
