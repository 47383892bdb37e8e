//! Server configuration parsed from environment variables.

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3004;
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_STATIC_DIR: &str = "dist";
pub const DEFAULT_SVG_PAGE_GAP_PT: f64 = 5.0;

/// Font directories searched when `FONT_PATHS` is unset. Bundled CJK fonts first.
pub const DEFAULT_FONT_PATHS: [&str; 5] = [
    "assets/fonts/zh",
    "assets/fonts",
    "/usr/share/fonts/",
    "/System/Library/Fonts/",
    "/usr/local/share/fonts/",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub body_limit_bytes: usize,
    pub font_paths: Vec<PathBuf>,
    pub static_dir: PathBuf,
    pub svg_page_gap_pt: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            font_paths: DEFAULT_FONT_PATHS.iter().map(PathBuf::from).collect(),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            svg_page_gap_pt: DEFAULT_SVG_PAGE_GAP_PT,
        }
    }
}

impl ServerConfig {
    /// Build typed server config from environment variables.
    ///
    /// Optional:
    /// - `PORT`: default 3004
    /// - `BODY_LIMIT_BYTES`: default 10 MiB
    /// - `FONT_PATHS`: `:`-separated font directories
    /// - `STATIC_DIR`: front-end bundle directory, default `dist`
    /// - `SVG_PAGE_GAP_PT`: gap between pages in merged SVG output, default 5
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable is set but does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = env_parse("PORT", defaults.port)?;
        let body_limit_bytes = env_parse("BODY_LIMIT_BYTES", defaults.body_limit_bytes)?;
        let svg_page_gap_pt = env_parse("SVG_PAGE_GAP_PT", defaults.svg_page_gap_pt)?;
        if !svg_page_gap_pt.is_finite() || svg_page_gap_pt < 0.0 {
            return Err(ConfigError::Invalid { key: "SVG_PAGE_GAP_PT", value: svg_page_gap_pt.to_string() });
        }

        let font_paths = std::env::var("FONT_PATHS")
            .ok()
            .map_or(defaults.font_paths, |raw| parse_font_paths(&raw));
        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        Ok(Self { port, body_limit_bytes, font_paths, static_dir, svg_page_gap_pt })
    }
}

fn env_parse<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Split a `:`-separated list of directories, dropping empty entries.
pub(crate) fn parse_font_paths(raw: &str) -> Vec<PathBuf> {
    raw.split(':')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
