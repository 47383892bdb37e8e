//! Uniform JSON error envelope for every API route.
//!
//! Handlers return `Result<_, ApiError>`; each error renders once, at the
//! boundary, as `{ "success": false, "error": message }`.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::warn;

use crate::compiler::CompilerError;
use crate::services::document::DocumentError;
use crate::services::template::TemplateError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn bad_request(message: &str) -> Self {
        Self::BadRequest(message.to_owned())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "api: request failed");
        }
        (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<CompilerError> for ApiError {
    fn from(err: CompilerError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::NotFound(_) => Self::NotFound(err.to_string()),
        }
    }
}

impl From<TemplateError> for ApiError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::NotFound(_) => Self::NotFound(err.to_string()),
        }
    }
}

/// Method fallback for API routes.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

/// `{ "success": true }`
pub(crate) fn ok() -> Json<serde_json::Value> {
    Json(json!({ "success": true }))
}
