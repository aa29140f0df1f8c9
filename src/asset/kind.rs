//! Asset kind definitions.

use std::path::Path;

use crate::utils::mime;
use crate::utils::path::route::url_extension;

/// Fallback extension for cached files whose kind carries none.
const UNKNOWN_EXTENSION: &str = "bin";

/// Kind of cacheable static asset.
///
/// Decides the cache subdirectory (bucket) and the cached file's extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// JavaScript, cached under `js/`.
    Script,
    /// CSS, cached under `css/`.
    Stylesheet,
    /// Any image format, cached under `img/` with its own extension.
    Image,
    /// Other static formats (fonts, media), bucketed by extension.
    Other(String),
}

impl AssetKind {
    /// Kind for a lowercase file extension.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.to_ascii_lowercase();
        match ext.as_str() {
            "js" | "mjs" | "cjs" => Self::Script,
            "css" => Self::Stylesheet,
            _ if mime::is_image(mime::from_extension(&ext)) => Self::Image,
            _ => Self::other(&ext),
        }
    }

    /// Kind for a MIME type, if it names a script, stylesheet or image.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        if mime::is_image(mime_type) {
            Some(Self::Image)
        } else if mime::is_stylesheet(mime_type) {
            Some(Self::Stylesheet)
        } else if mime::is_script(mime_type) {
            Some(Self::Script)
        } else {
            None
        }
    }

    /// Build an `Other` kind, keeping only ASCII alphanumerics of `ext`.
    pub fn other(ext: &str) -> Self {
        let cleaned: String = ext
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .take(10)
            .collect::<String>()
            .to_ascii_lowercase();
        if cleaned.is_empty() {
            Self::Other(UNKNOWN_EXTENSION.to_string())
        } else {
            Self::Other(cleaned)
        }
    }

    /// Cache subdirectory for this kind.
    pub fn bucket(&self) -> &str {
        match self {
            Self::Script => "js",
            Self::Stylesheet => "css",
            Self::Image => "img",
            Self::Other(ext) => ext,
        }
    }

    /// Extension of the cached copy of `source`.
    ///
    /// Images keep their own format's extension.
    pub fn cache_extension(&self, source: &Path) -> String {
        match self {
            Self::Script => "js".to_string(),
            Self::Stylesheet => "css".to_string(),
            Self::Image => source
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
                .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
                .unwrap_or_else(|| "img".to_string()),
            Self::Other(ext) => ext.clone(),
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Script => write!(f, "script"),
            Self::Stylesheet => write!(f, "stylesheet"),
            Self::Image => write!(f, "image"),
            Self::Other(ext) => write!(f, "{ext}"),
        }
    }
}

/// Decide the kind an asset URL is cached as.
///
/// The URL's own extension wins when present; `fallback` (taken from the
/// markup or the registration context) applies to extensionless URLs.
/// Returns `None` for formats that must never be mirrored into the public
/// cache, such as server-side scripts.
pub fn classify(url: &str, fallback: Option<&AssetKind>) -> Option<AssetKind> {
    match url_extension(url) {
        Some(ext) if mime::is_static_extension(&ext) => Some(AssetKind::from_extension(&ext)),
        Some(_) => None,
        None => fallback.filter(|k| !matches!(k, AssetKind::Other(_))).cloned(),
    }
}

/// Kind of a resolved source file, from its own extension.
///
/// `None` unless the file carries a known static-format extension. This is
/// the final gate before a file is copied into the public cache; the URL
/// text may disagree with the file it resolves to (symlinks).
pub fn source_kind(path: &Path) -> Option<AssetKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    mime::is_static_extension(&ext).then(|| AssetKind::from_extension(&ext))
}
