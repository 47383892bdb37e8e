//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the compiler relay and the editor store endpoints under `/api`, and
//! serves the built front-end bundle for every other path. Every API route
//! answers an unsupported method with the JSON `405` envelope, and unknown
//! `/api` paths with a JSON `404`, so clients never see a bare error page.

pub mod chat;
pub mod compile;
pub mod documents;
pub mod error;
pub mod highlight;
pub mod templates;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get, patch, post, put};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::state::AppState;
use error::{ApiError, method_not_allowed};

/// API routes only, without the static fallback.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/compile", post(compile::compile).fallback(method_not_allowed))
        .route("/api/add-source", post(compile::add_source).fallback(method_not_allowed))
        .route("/api/map-shadow", post(compile::map_shadow).fallback(method_not_allowed))
        .route("/api/evict-cache", post(compile::evict_cache).fallback(method_not_allowed))
        .route("/api/reset-shadow", post(compile::reset_shadow).fallback(method_not_allowed))
        .route("/api/health", get(compile::health).fallback(method_not_allowed))
        .route(
            "/api/documents",
            get(documents::list_documents)
                .post(documents::create_document)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/documents/{id}",
            get(documents::get_document)
                .delete(documents::delete_document)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/documents/{id}/content",
            put(documents::update_content).fallback(method_not_allowed),
        )
        .route(
            "/api/documents/{id}/editor",
            patch(documents::update_editor).fallback(method_not_allowed),
        )
        .route("/api/documents/{id}/save", post(documents::save_document).fallback(method_not_allowed))
        .route(
            "/api/templates",
            get(templates::list_templates)
                .post(templates::create_template)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/templates/{id}",
            get(templates::get_template)
                .patch(templates::update_template)
                .delete(templates::delete_template)
                .fallback(method_not_allowed),
        )
        .route(
            "/api/chat",
            get(chat::list_messages)
                .post(chat::send_message)
                .delete(chat::clear_messages)
                .fallback(method_not_allowed),
        )
        .route("/api/highlight", post(highlight::tokenize).fallback(method_not_allowed))
        .route("/api/{*rest}", any(api_not_found))
}

/// Full application: API routes, middleware, and the static bundle fallback.
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let static_files = ServeDir::new(&config.static_dir).append_index_html_on_directories(true);

    api_routes()
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(config.body_limit_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn api_not_found() -> ApiError {
    ApiError::NotFound("Not found".to_owned())
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
