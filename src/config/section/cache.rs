//! `[cache]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [cache]
//! dir = "wp-content/uploads/assets"   # relative to site.root, or absolute
//! url = "https://static.example.com"  # optional, default: site.url + dir
//! map_file = "map.json"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::MAP_FILE;
use crate::config::{ConfigDiagnostics, FieldPath};

/// Field paths of `[cache]`, for diagnostics.
pub struct CacheFields {
    pub dir: FieldPath,
    pub url: FieldPath,
    pub map_file: FieldPath,
}

/// Cache directory location and its public URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSectionConfig {
    /// Cache directory.
    pub dir: PathBuf,

    /// Public URL of the cache directory. Derived from the site URL and
    /// `dir` when unset.
    pub url: Option<String>,

    /// Map file name inside `dir`.
    pub map_file: String,
}

impl Default for CacheSectionConfig {
    fn default() -> Self {
        Self {
            dir: "wp-content/uploads/assets".into(),
            url: None,
            map_file: MAP_FILE.into(),
        }
    }
}

impl CacheSectionConfig {
    pub const FIELDS: CacheFields = CacheFields {
        dir: FieldPath::new("cache.dir"),
        url: FieldPath::new("cache.url"),
        map_file: FieldPath::new("cache.map_file"),
    };

    /// Resolve `dir` against the document root.
    pub fn normalize(&mut self, root: &Path) {
        self.dir = crate::utils::path::resolve_path(&self.dir, root);
    }

    /// Validate cache configuration.
    ///
    /// # Checks
    /// - `url`, if set, must be absolute (`https://…`) or root-relative (`/…`)
    /// - `map_file` must be a bare file name
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.dir.as_os_str().is_empty() {
            diag.error(Self::FIELDS.dir, "cache directory is not configured");
        }

        if let Some(url) = &self.url {
            let absolute = url::Url::parse(url)
                .is_ok_and(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some());
            if !absolute && !(url.starts_with('/') && !url.starts_with("//")) {
                diag.error_with_hint(
                    Self::FIELDS.url,
                    format!("`{url}` is neither an absolute http(s) URL nor root-relative"),
                    "use e.g. \"https://example.com/assets\" or \"/assets\"",
                );
            }
        }

        let bare = !self.map_file.is_empty()
            && !self.map_file.contains(['/', '\\'])
            && self.map_file != "."
            && self.map_file != "..";
        if !bare {
            diag.error_with_hint(
                Self::FIELDS.map_file,
                format!("`{}` is not a bare file name", self.map_file),
                format!("use e.g. \"{MAP_FILE}\""),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let section = CacheSectionConfig::default();
        assert_eq!(section.map_file, "map.json");
        assert!(section.url.is_none());
        assert!(section.dir.is_relative());
    }

    #[test]
    fn test_normalize() {
        let mut section = CacheSectionConfig::default();
        section.normalize(Path::new("/srv/www"));
        assert_eq!(section.dir, Path::new("/srv/www/wp-content/uploads/assets"));

        let mut section = CacheSectionConfig {
            dir: "/var/cache/assets".into(),
            ..Default::default()
        };
        section.normalize(Path::new("/srv/www"));
        assert_eq!(section.dir, Path::new("/var/cache/assets"));
    }

    #[test]
    fn test_url_forms() {
        for (url, ok) in [
            ("https://cdn.example.com/assets", true),
            ("/assets", true),
            ("//cdn.example.com/assets", false),
            ("assets", false),
            ("ftp://example.com", false),
        ] {
            let section = CacheSectionConfig {
                url: Some(url.into()),
                ..Default::default()
            };
            let mut diag = ConfigDiagnostics::new();
            section.validate(&mut diag);
            assert_eq!(diag.is_empty(), ok, "{url}");
        }
    }

    #[test]
    fn test_map_file_must_be_bare() {
        for name in ["", "..", "../map.json", "sub/map.json"] {
            let section = CacheSectionConfig {
                map_file: name.into(),
                ..Default::default()
            };
            let mut diag = ConfigDiagnostics::new();
            section.validate(&mut diag);
            assert!(diag.has_error_for("cache.map_file"), "{name}");
        }
    }
}
