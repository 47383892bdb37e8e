//! Compiler handle — the single seam to the external Typst compiler.
//!
//! DESIGN
//! ======
//! Every compile-related endpoint relays to exactly one [`Compiler`] method.
//! The concrete compiler is expensive to construct (font discovery, warm-up
//! compile), so [`CompilerHandle`] builds it lazily on first use and memoizes
//! it for the life of the process. Concurrent first callers await the same
//! in-flight initialization. A failed initialization is not cached: the next
//! request tries again.

mod engine;
mod fonts;
mod world;

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{info, warn};

pub use engine::TypstCompiler;

use crate::config::ServerConfig;

/// Source compiled during initialization. Exercises CJK font fallback.
pub const WARMUP_DOCUMENT: &str = "= 测试中文\n\n这是一个测试文档。";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    /// Compiler construction or warm-up failed.
    #[error("compiler initialization failed: {0}")]
    Init(String),

    /// No usable font was found in any font source.
    #[error("no fonts could be loaded")]
    NoFonts,

    /// The document failed to compile. Carries the joined diagnostics.
    #[error("{0}")]
    Compile(String),

    /// The PDF exporter rejected the compiled document.
    #[error("pdf export failed: {0}")]
    Export(String),

    /// The blocking compile task panicked or was cancelled.
    #[error("compile task failed: {0}")]
    Task(String),
}

// =============================================================================
// REQUEST TYPES
// =============================================================================

/// Output format accepted by `/api/compile`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileFormat {
    Pdf,
    Svg,
    PlainSvg,
}

impl CompileFormat {
    #[must_use]
    pub fn from_str(raw: &str) -> Option<Self> {
        match raw {
            "pdf" => Some(Self::Pdf),
            "svg" => Some(Self::Svg),
            "plainSvg" => Some(Self::PlainSvg),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Svg => "svg",
            Self::PlainSvg => "plainSvg",
        }
    }
}

/// Main-file content plus `sys.inputs` for one compilation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileRequest {
    pub content: String,
    pub inputs: BTreeMap<String, String>,
}

impl CompileRequest {
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), inputs: BTreeMap::new() }
    }

    #[must_use]
    pub fn with_inputs(mut self, inputs: BTreeMap<String, String>) -> Self {
        self.inputs = inputs;
        self
    }
}

// =============================================================================
// COMPILER TRAIT
// =============================================================================

/// Operations exposed by the external compiler. Implementations return the
/// library's output verbatim and forward its errors.
#[async_trait::async_trait]
pub trait Compiler: Send + Sync {
    /// Human-readable compiler label reported by the health endpoint.
    fn name(&self) -> &str;

    async fn svg(&self, request: CompileRequest) -> Result<String, CompilerError>;

    async fn plain_svg(&self, request: CompileRequest) -> Result<String, CompilerError>;

    async fn pdf(&self, request: CompileRequest) -> Result<Vec<u8>, CompilerError>;

    /// Declare an extra source file visible to `#import`/`#include`.
    async fn add_source(&self, path: &str, content: String) -> Result<(), CompilerError>;

    /// Map binary data to a virtual path (images, bibliographies, fonts...).
    async fn map_shadow(&self, path: &str, data: Vec<u8>) -> Result<(), CompilerError>;

    /// Drop memoized compilation results older than `max_age` evictions.
    async fn evict_cache(&self, max_age: usize) -> Result<(), CompilerError>;

    /// Forget every added source and shadow file.
    async fn reset_shadow(&self) -> Result<(), CompilerError>;
}

// =============================================================================
// HANDLE
// =============================================================================

/// Builds the concrete compiler. Runs on the blocking pool.
pub type CompilerFactory = Arc<dyn Fn() -> Result<Arc<dyn Compiler>, CompilerError> + Send + Sync>;

/// Lazily constructed, memoized compiler shared by all requests.
#[derive(Clone)]
pub struct CompilerHandle {
    cell: Arc<OnceCell<Arc<dyn Compiler>>>,
    factory: CompilerFactory,
}

impl CompilerHandle {
    #[must_use]
    pub fn new(factory: CompilerFactory) -> Self {
        Self { cell: Arc::new(OnceCell::new()), factory }
    }

    /// Handle backed by [`TypstCompiler`] configured from `config`.
    #[must_use]
    pub fn typst(config: &ServerConfig) -> Self {
        let font_paths = config.font_paths.clone();
        let page_gap = config.svg_page_gap_pt;
        Self::new(Arc::new(move || {
            let compiler = TypstCompiler::new(&font_paths, page_gap)?;
            Ok(Arc::new(compiler) as Arc<dyn Compiler>)
        }))
    }

    /// Return the shared compiler, initializing it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::Init`] if construction or the warm-up compile
    /// fails. The handle stays uninitialized so a later call retries.
    pub async fn get(&self) -> Result<Arc<dyn Compiler>, CompilerError> {
        self.cell
            .get_or_try_init(|| self.initialize())
            .await
            .cloned()
    }

    /// Whether initialization has completed successfully.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.cell.initialized()
    }

    async fn initialize(&self) -> Result<Arc<dyn Compiler>, CompilerError> {
        info!("compiler: initializing");
        let factory = Arc::clone(&self.factory);
        let compiler = tokio::task::spawn_blocking(move || factory())
            .await
            .map_err(|e| CompilerError::Init(e.to_string()))?
            .inspect_err(|e| warn!(error = %e, "compiler: construction failed"))?;

        let probe = compiler
            .svg(CompileRequest::new(WARMUP_DOCUMENT))
            .await
            .map_err(|e| {
                warn!(error = %e, "compiler: warm-up compile failed");
                CompilerError::Init(e.to_string())
            })?;

        info!(compiler = compiler.name(), svg_len = probe.len(), "compiler: ready");
        Ok(compiler)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
