use std::sync::atomic::{AtomicUsize, Ordering};

use super::test_helpers::{MockCompiler, counting_handle};
use super::*;

#[test]
fn format_parses_wire_names() {
    assert_eq!(CompileFormat::from_str("pdf"), Some(CompileFormat::Pdf));
    assert_eq!(CompileFormat::from_str("svg"), Some(CompileFormat::Svg));
    assert_eq!(CompileFormat::from_str("plainSvg"), Some(CompileFormat::PlainSvg));
    assert_eq!(CompileFormat::from_str("png"), None);
    assert_eq!(CompileFormat::from_str("SVG"), None);
}

#[test]
fn format_as_str_matches_wire_names() {
    for format in [CompileFormat::Pdf, CompileFormat::Svg, CompileFormat::PlainSvg] {
        assert_eq!(CompileFormat::from_str(format.as_str()), Some(format));
    }
}

#[tokio::test]
async fn repeated_get_initializes_once() {
    let count = Arc::new(AtomicUsize::new(0));
    let mock = Arc::new(MockCompiler::default());
    let handle = counting_handle(Arc::clone(&mock), Arc::clone(&count));

    assert!(!handle.is_ready());
    for _ in 0..3 {
        handle.get().await.unwrap();
    }
    assert!(handle.is_ready());
    assert_eq!(count.load(Ordering::SeqCst), 1);
    // Only the warm-up compile reached the compiler.
    assert_eq!(mock.calls(), vec![format!("svg:{WARMUP_DOCUMENT}")]);
}

#[tokio::test]
async fn concurrent_get_shares_initialization() {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = counting_handle(Arc::new(MockCompiler::default()), Arc::clone(&count));

    let results = futures::future::join_all((0..16).map(|_| {
        let handle = handle.clone();
        async move { handle.get().await }
    }))
    .await;

    assert!(results.iter().all(Result::is_ok));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn failed_warmup_is_retried() {
    let count = Arc::new(AtomicUsize::new(0));
    let handle = counting_handle(Arc::new(MockCompiler::failing("no fonts")), Arc::clone(&count));

    let err = handle.get().await.err().unwrap();
    assert!(matches!(err, CompilerError::Init(ref m) if m.contains("no fonts")));
    assert!(!handle.is_ready());

    assert!(handle.get().await.is_err());
    assert_eq!(count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn factory_error_is_propagated() {
    let handle = CompilerHandle::new(Arc::new(|| Err(CompilerError::NoFonts)));
    let err = handle.get().await.err().unwrap();
    assert!(matches!(err, CompilerError::NoFonts));
}

#[test]
fn compile_request_with_inputs_replaces_map() {
    let mut inputs = BTreeMap::new();
    inputs.insert("title".to_owned(), "Draft".to_owned());
    let request = CompileRequest::new("= Doc").with_inputs(inputs.clone());
    assert_eq!(request.content, "= Doc");
    assert_eq!(request.inputs, inputs);
}
