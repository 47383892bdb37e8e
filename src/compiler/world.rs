//! Per-request Typst `World`.
//!
//! A [`LycheeWorld`] is a cheap snapshot: fonts and the default library are
//! shared through `Arc`, while the virtual filesystem is cloned from the
//! compiler at request time. Later `add_source`/`map_shadow` calls never
//! affect a compilation already in flight.

use std::collections::HashMap;
use std::sync::Arc;

use time::{OffsetDateTime, UtcOffset};
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source, VirtualPath};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, World};

use super::fonts::FontSet;

/// Virtual path of the request's main file.
pub const MAIN_PATH: &str = "/main.typ";

/// Added sources and shadow files, keyed by rooted virtual path.
#[derive(Clone, Default)]
pub struct VirtualFs {
    pub sources: HashMap<String, Source>,
    pub shadows: HashMap<String, Bytes>,
}

impl VirtualFs {
    pub fn insert_source(&mut self, path: &str, content: String) {
        let key = normalize_path(path);
        let id = FileId::new(None, VirtualPath::new(&key));
        self.sources.insert(key, Source::new(id, content));
    }

    pub fn insert_shadow(&mut self, path: &str, data: Vec<u8>) {
        self.shadows.insert(normalize_path(path), Bytes::new(data));
    }

    pub fn clear(&mut self) {
        self.sources.clear();
        self.shadows.clear();
    }
}

/// Root a client-supplied path so `chapter.typ` and `/chapter.typ` agree.
#[must_use]
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_start_matches("./");
    if trimmed.starts_with('/') { trimmed.to_owned() } else { format!("/{trimmed}") }
}

pub struct LycheeWorld {
    library: Arc<LazyHash<Library>>,
    fonts: Arc<FontSet>,
    main: Source,
    vfs: VirtualFs,
}

impl LycheeWorld {
    #[must_use]
    pub fn new(library: Arc<LazyHash<Library>>, fonts: Arc<FontSet>, content: String, vfs: VirtualFs) -> Self {
        let main_id = FileId::new(None, VirtualPath::new(MAIN_PATH));
        Self { library, fonts, main: Source::new(main_id, content), vfs }
    }

    fn lookup_key(id: FileId) -> FileResult<String> {
        let path = id.vpath().as_rooted_path();
        if id.package().is_some() {
            return Err(FileError::NotFound(path.to_path_buf()));
        }
        Ok(path.to_string_lossy().into_owned())
    }
}

impl World for LycheeWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.fonts.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            return Ok(self.main.clone());
        }
        let key = Self::lookup_key(id)?;
        if let Some(source) = self.vfs.sources.get(&key) {
            return Ok(source.clone());
        }
        // A shadow file can stand in for a source if it is valid UTF-8.
        match self.vfs.shadows.get(&key) {
            Some(data) => {
                let text = std::str::from_utf8(data).map_err(|_| FileError::InvalidUtf8)?;
                Ok(Source::new(id, text.to_owned()))
            }
            None => Err(FileError::NotFound(id.vpath().as_rooted_path().to_path_buf())),
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        let key = Self::lookup_key(id)?;
        if let Some(data) = self.vfs.shadows.get(&key) {
            return Ok(data.clone());
        }
        match self.vfs.sources.get(&key) {
            Some(source) => Ok(Bytes::new(source.text().as_bytes().to_vec())),
            None => Err(FileError::NotFound(id.vpath().as_rooted_path().to_path_buf())),
        }
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index)
    }

    fn today(&self, offset: Option<i64>) -> Option<Datetime> {
        let hours = i8::try_from(offset.unwrap_or(0)).ok()?;
        let now = OffsetDateTime::now_utc().to_offset(UtcOffset::from_hms(hours, 0, 0).ok()?);
        Datetime::from_ymd(now.year(), now.month().into(), now.day())
    }
}
