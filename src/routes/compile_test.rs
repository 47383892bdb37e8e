use std::sync::Arc;

use axum::extract::FromRequest;
use serde::de::DeserializeOwned;

use super::*;
use crate::compiler::test_helpers::MockCompiler;
use crate::state::test_helpers;

fn body<T: DeserializeOwned>(value: serde_json::Value) -> Result<Json<T>, JsonRejection> {
    Ok(Json(serde_json::from_value(value).unwrap()))
}

async fn json_of(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn error_of<T: IntoResponse>(result: Result<T, ApiError>) -> (StatusCode, serde_json::Value) {
    let response = match result {
        Ok(_) => panic!("expected an error"),
        Err(e) => e.into_response(),
    };
    let status = response.status();
    (status, json_of(response).await)
}

fn failing_state() -> AppState {
    test_helpers::test_app_state_with_compiler(Arc::new(MockCompiler::failing("boom")))
}

// =============================================================================
// /api/compile
// =============================================================================

#[tokio::test]
async fn compile_svg_wraps_text_in_json() {
    let state = test_helpers::test_app_state();
    let response = compile(State(state), body(json!({ "content": "= Hi", "format": "svg" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_of(response).await;
    assert_eq!(json, json!({ "success": true, "result": "<svg>= Hi</svg>", "format": "svg" }));
}

#[tokio::test]
async fn compile_defaults_to_svg() {
    let state = test_helpers::test_app_state();
    let response = compile(State(state), body(json!({ "content": "x" }))).await.unwrap();
    assert_eq!(json_of(response).await["format"], "svg");
}

#[tokio::test]
async fn compile_plain_svg_uses_plain_method() {
    let mock = Arc::new(MockCompiler::default());
    let state = test_helpers::test_app_state_with_compiler(Arc::clone(&mock));
    let response = compile(State(state), body(json!({ "content": "x", "format": "plainSvg" })))
        .await
        .unwrap();
    let json = json_of(response).await;
    assert_eq!(json["format"], "plainSvg");
    assert_eq!(json["result"], "<svg plain>x</svg>");
    assert_eq!(mock.calls().last().unwrap(), "plainSvg:x");
}

#[tokio::test]
async fn compile_pdf_returns_binary() {
    let state = test_helpers::test_app_state();
    let response = compile(State(state), body(json!({ "content": "= Hi", "format": "pdf" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
    assert_eq!(response.headers()[CONTENT_DISPOSITION], "inline; filename=\"document.pdf\"");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(bytes.starts_with(b"%PDF-"));
}

#[tokio::test]
async fn compile_without_content_is_bad_request() {
    for payload in [json!({}), json!({ "content": "" }), json!({ "format": "pdf" })] {
        let (status, json) = error_of(compile(State(failing_state()), body(payload)).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({ "success": false, "error": "Content is required" }));
    }
}

#[tokio::test]
async fn compile_rejects_unsupported_format() {
    let state = test_helpers::test_app_state();
    let (status, json) = error_of(compile(State(state), body(json!({ "content": "x", "format": "png" }))).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Unsupported format. Use: pdf, svg, plainSvg");
}

#[tokio::test]
async fn compile_failure_is_internal_error() {
    let (status, json) = error_of(compile(State(failing_state()), body(json!({ "content": "x" }))).await).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("boom"));
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let request = axum::http::Request::builder()
        .method("POST")
        .header(CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let payload = Json::<CompileBody>::from_request(request, &()).await;
    assert!(payload.is_err());

    let state = test_helpers::test_app_state();
    let (status, json) = error_of(compile(State(state), payload).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
}

#[test]
fn stringify_inputs_keeps_scalars_and_drops_null() {
    let serde_json::Value::Object(map) = json!({ "a": "x", "b": 2, "c": true, "d": null }) else {
        unreachable!()
    };
    let inputs = stringify_inputs(map);
    assert_eq!(inputs.get("a").map(String::as_str), Some("x"));
    assert_eq!(inputs.get("b").map(String::as_str), Some("2"));
    assert_eq!(inputs.get("c").map(String::as_str), Some("true"));
    assert!(!inputs.contains_key("d"));
}

// =============================================================================
// auxiliary pass-throughs
// =============================================================================

#[tokio::test]
async fn add_source_forwards_to_compiler() {
    let mock = Arc::new(MockCompiler::default());
    let state = test_helpers::test_app_state_with_compiler(Arc::clone(&mock));
    let Json(json) = add_source(State(state), body(json!({ "path": "lib.typ", "content": "#let x = 1" })))
        .await
        .unwrap();
    assert_eq!(json, json!({ "success": true }));
    assert_eq!(mock.calls().last().unwrap(), "add_source:lib.typ:#let x = 1");
}

#[tokio::test]
async fn add_source_requires_both_fields() {
    for payload in [json!({ "path": "a.typ" }), json!({ "content": "x" }), json!({ "path": "", "content": "x" })] {
        let (status, json) = error_of(add_source(State(failing_state()), body(payload)).await).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Path and content are required");
    }
}

#[tokio::test]
async fn map_shadow_decodes_base64() {
    let mock = Arc::new(MockCompiler::default());
    let state = test_helpers::test_app_state_with_compiler(Arc::clone(&mock));
    let data = STANDARD.encode([0u8, 1, 2, 3, 4]);
    let Json(json) = map_shadow(State(state), body(json!({ "path": "img.png", "data": data })))
        .await
        .unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(mock.calls().last().unwrap(), "map_shadow:img.png:5");
}

#[tokio::test]
async fn map_shadow_accepts_line_wrapped_base64() {
    let mock = Arc::new(MockCompiler::default());
    let state = test_helpers::test_app_state_with_compiler(Arc::clone(&mock));
    let encoded = STANDARD.encode([7u8; 60]);
    let wrapped = format!("{}\n{}\r\n", &encoded[..40], &encoded[40..]);
    map_shadow(State(state), body(json!({ "path": "blob.bin", "data": wrapped })))
        .await
        .unwrap();
    assert_eq!(mock.calls().last().unwrap(), "map_shadow:blob.bin:60");
}

#[tokio::test]
async fn map_shadow_requires_both_fields() {
    let (status, json) = error_of(map_shadow(State(failing_state()), body(json!({ "path": "a" }))).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Path and data are required");
}

#[tokio::test]
async fn map_shadow_rejects_invalid_base64() {
    let state = test_helpers::test_app_state();
    let (status, _) = error_of(map_shadow(State(state), body(json!({ "path": "a", "data": "***" }))).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn evict_cache_defaults_max_age() {
    let mock = Arc::new(MockCompiler::default());
    let state = test_helpers::test_app_state_with_compiler(Arc::clone(&mock));
    evict_cache(State(state.clone()), Bytes::new()).await.unwrap();
    assert_eq!(mock.calls().last().unwrap(), "evict_cache:10");

    evict_cache(State(state), Bytes::from_static(br#"{"maxAge": 3}"#)).await.unwrap();
    assert_eq!(mock.calls().last().unwrap(), "evict_cache:3");
}

#[tokio::test]
async fn evict_cache_rejects_bad_body() {
    let state = test_helpers::test_app_state();
    let (status, _) = error_of(evict_cache(State(state), Bytes::from_static(br#"{"maxAge": -1}"#)).await).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reset_shadow_forwards_to_compiler() {
    let mock = Arc::new(MockCompiler::default());
    let state = test_helpers::test_app_state_with_compiler(Arc::clone(&mock));
    let Json(json) = reset_shadow(State(state)).await.unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(mock.calls().last().unwrap(), "reset_shadow");
}

// =============================================================================
// /api/health
// =============================================================================

#[tokio::test]
async fn health_reports_ready() {
    let state = test_helpers::test_app_state();
    let response = health(State(state)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_of(response).await, json!({ "success": true, "status": "ready", "compiler": "mock" }));
}

#[tokio::test]
async fn health_reports_init_failure() {
    let response = health(State(failing_state())).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_of(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["status"], "error");
    assert!(json["error"].as_str().unwrap().contains("boom"));
}
