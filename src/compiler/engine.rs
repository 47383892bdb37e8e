//! `TypstCompiler` — [`Compiler`] backed by the `typst` crates.
//!
//! Each call snapshots the virtual filesystem into a fresh [`LycheeWorld`]
//! and runs the compile on the blocking pool. Output is relayed verbatim:
//! merged SVG from `typst-svg`, PDF bytes from `typst-pdf`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};
use typst::diag::{SourceDiagnostic, Warned};
use typst::foundations::{Dict, Str, Value};
use typst::layout::{Abs, PagedDocument};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt};

use super::fonts::FontSet;
use super::world::{LycheeWorld, VirtualFs};
use super::{CompileRequest, Compiler, CompilerError};

pub struct TypstCompiler {
    library: Arc<LazyHash<Library>>,
    fonts: Arc<FontSet>,
    vfs: RwLock<VirtualFs>,
    page_gap: Abs,
}

impl TypstCompiler {
    /// Discover fonts and prepare the standard library.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::NoFonts`] if no font could be loaded.
    pub fn new(font_paths: &[PathBuf], page_gap_pt: f64) -> Result<Self, CompilerError> {
        let fonts = FontSet::load(font_paths)?;
        Ok(Self {
            library: Arc::new(LazyHash::new(Library::default())),
            fonts: Arc::new(fonts),
            vfs: RwLock::new(VirtualFs::default()),
            page_gap: Abs::pt(page_gap_pt),
        })
    }

    fn world(&self, request: CompileRequest) -> LycheeWorld {
        let library = if request.inputs.is_empty() {
            Arc::clone(&self.library)
        } else {
            Arc::new(LazyHash::new(Library::builder().with_inputs(inputs_dict(request.inputs)).build()))
        };
        let vfs = self
            .vfs
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        LycheeWorld::new(library, Arc::clone(&self.fonts), request.content, vfs)
    }

    fn with_vfs(&self, f: impl FnOnce(&mut VirtualFs)) {
        let mut vfs = self
            .vfs
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut vfs);
    }

    /// Compile on the blocking pool, then hand the document to `export`.
    async fn run<T, F>(&self, request: CompileRequest, export: F) -> Result<T, CompilerError>
    where
        T: Send + 'static,
        F: FnOnce(&PagedDocument) -> Result<T, CompilerError> + Send + 'static,
    {
        let world = self.world(request);
        tokio::task::spawn_blocking(move || {
            let Warned { output, warnings } = typst::compile::<PagedDocument>(&world);
            if !warnings.is_empty() {
                debug!(warnings = %join_diagnostics(&warnings), "compile: warnings");
            }
            let document = output.map_err(|errors| CompilerError::Compile(join_diagnostics(&errors)))?;
            export(&document)
        })
        .await
        .map_err(|e| CompilerError::Task(e.to_string()))?
    }
}

#[async_trait::async_trait]
impl Compiler for TypstCompiler {
    fn name(&self) -> &str {
        "Rust Typst Compiler"
    }

    async fn svg(&self, request: CompileRequest) -> Result<String, CompilerError> {
        let gap = self.page_gap;
        self.run(request, move |document| Ok(typst_svg::svg_merged(document, gap)))
            .await
    }

    async fn plain_svg(&self, request: CompileRequest) -> Result<String, CompilerError> {
        self.run(request, |document| Ok(typst_svg::svg_merged(document, Abs::zero())))
            .await
    }

    async fn pdf(&self, request: CompileRequest) -> Result<Vec<u8>, CompilerError> {
        self.run(request, |document| {
            typst_pdf::pdf(document, &typst_pdf::PdfOptions::default())
                .map_err(|errors| CompilerError::Export(join_diagnostics(&errors)))
        })
        .await
    }

    async fn add_source(&self, path: &str, content: String) -> Result<(), CompilerError> {
        self.with_vfs(|vfs| vfs.insert_source(path, content));
        debug!(%path, "compiler: source added");
        Ok(())
    }

    async fn map_shadow(&self, path: &str, data: Vec<u8>) -> Result<(), CompilerError> {
        let len = data.len();
        self.with_vfs(|vfs| vfs.insert_shadow(path, data));
        debug!(%path, len, "compiler: shadow mapped");
        Ok(())
    }

    async fn evict_cache(&self, max_age: usize) -> Result<(), CompilerError> {
        comemo::evict(max_age);
        info!(max_age, "compiler: cache evicted");
        Ok(())
    }

    async fn reset_shadow(&self) -> Result<(), CompilerError> {
        self.with_vfs(VirtualFs::clear);
        info!("compiler: shadow files reset");
        Ok(())
    }
}

/// Expose request inputs to documents as `sys.inputs`.
fn inputs_dict(inputs: BTreeMap<String, String>) -> Dict {
    inputs
        .into_iter()
        .map(|(key, value)| (Str::from(key), Value::Str(Str::from(value))))
        .collect()
}

fn join_diagnostics(diagnostics: &[SourceDiagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| d.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
#[path = "engine_test.rs"]
mod tests;
