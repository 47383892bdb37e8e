//! Font discovery for the Typst world.
//!
//! Faces come from three sources, in priority order:
//! - configured font directories (bundled CJK fonts first)
//! - system fonts discovered by `fontdb`
//! - Typst's embedded fonts from `typst-assets`, always appended so a bare
//!   container still renders Latin text and math
//!
//! Indices into [`FontSet::fonts`] match the [`FontBook`] built from them.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fontdb::{Database, Source as FontSource};
use tracing::{debug, info};
use typst::foundations::Bytes;
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;

use super::CompilerError;

pub struct FontSet {
    pub book: LazyHash<FontBook>,
    pub fonts: Vec<Font>,
}

impl FontSet {
    /// Load every face reachable from `paths`, the system, and the embedded set.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::NoFonts`] if not a single face could be parsed.
    pub fn load(paths: &[PathBuf]) -> Result<Self, CompilerError> {
        let mut db = Database::new();
        for path in paths.iter().filter(|p| p.is_dir()) {
            debug!(path = %path.display(), "fonts: scanning directory");
            db.load_fonts_dir(path);
        }
        db.load_system_fonts();

        let mut fonts = Vec::new();
        // One read per file; collections expose several faces.
        let mut files: HashMap<PathBuf, Bytes> = HashMap::new();
        // Configured dirs may overlap the system dirs; each face enters the book once.
        let mut seen: HashSet<(PathBuf, u32)> = HashSet::new();

        for face in db.faces() {
            let FontSource::File(path) = &face.source else {
                continue;
            };
            if !seen.insert((path.clone(), face.index)) {
                continue;
            }
            let Some(data) = read_cached(&mut files, path) else {
                continue;
            };
            if let Some(font) = Font::new(data, face.index) {
                fonts.push(font);
            }
        }
        let discovered = fonts.len();

        for data in typst_assets::fonts() {
            fonts.extend(Font::iter(Bytes::new(data)));
        }

        if fonts.is_empty() {
            return Err(CompilerError::NoFonts);
        }

        info!(discovered, embedded = fonts.len() - discovered, "fonts: loaded");
        let book = FontBook::from_fonts(fonts.iter());
        Ok(Self { book: LazyHash::new(book), fonts })
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }
}

fn read_cached(files: &mut HashMap<PathBuf, Bytes>, path: &Path) -> Option<Bytes> {
    if let Some(data) = files.get(path) {
        return Some(data.clone());
    }
    let owned: Arc<[u8]> = Arc::from(std::fs::read(path).ok()?);
    let data = Bytes::new(owned);
    files.insert(path.to_path_buf(), data.clone());
    Some(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Write one embedded face to a fresh directory so tests have a known font file.
    fn font_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("lychee-fonts-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let data = typst_assets::fonts().next().unwrap();
        std::fs::write(dir.join("face.otf"), data).unwrap();
        dir
    }

    #[test]
    fn overlapping_directories_do_not_duplicate_faces() {
        let dir = font_dir();
        let once = FontSet::load(std::slice::from_ref(&dir)).unwrap();
        let twice = FontSet::load(&[dir.clone(), dir.clone()]).unwrap();
        assert_eq!(once.fonts.len(), twice.fonts.len());
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn embedded_fonts_are_always_present() {
        let set = FontSet::load(&[]).unwrap();
        let embedded: usize = typst_assets::fonts().map(|data| Font::iter(Bytes::new(data)).count()).sum();
        assert!(set.fonts.len() >= embedded);
        assert!(set.get(0).is_some());
    }
}
