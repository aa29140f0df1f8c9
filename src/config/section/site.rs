//! `[site]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [site]
//! url = "https://example.com/blog"   # public URL, path used as prefix
//! root = "/var/www/html"             # document root served at that URL
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::{ConfigDiagnostics, FieldPath};

/// Field paths of `[site]`, for diagnostics.
pub struct SiteFields {
    pub url: FieldPath,
    pub root: FieldPath,
}

/// Public site location and its document root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSectionConfig {
    /// Site URL (e.g. "https://example.com"). Its host decides which asset
    /// URLs are local.
    pub url: String,

    /// Document root. Relative paths are resolved against the config file.
    pub root: PathBuf,
}

impl SiteSectionConfig {
    pub const FIELDS: SiteFields = SiteFields {
        url: FieldPath::new("site.url"),
        root: FieldPath::new("site.root"),
    };

    /// Parsed site URL, or `None` if it is not a usable http(s) URL.
    pub fn parsed_url(&self) -> Option<Url> {
        Url::parse(&self.url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
    }

    pub fn normalize(&mut self, base: &Path) {
        self.root = crate::utils::path::normalize_path(&crate::utils::path::resolve_path(
            &self.root, base,
        ));
    }

    /// Validate site configuration.
    ///
    /// # Checks
    /// - `url` must be a valid http(s) URL with a host
    /// - `root` must be an existing directory
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.url.is_empty() {
            diag.error_with_hint(
                Self::FIELDS.url,
                "site URL is not configured",
                "set it, e.g.: \"https://example.com\"",
            );
        } else {
            match Url::parse(&self.url) {
                Ok(parsed) => {
                    if !matches!(parsed.scheme(), "http" | "https") {
                        diag.error_with_hint(
                            Self::FIELDS.url,
                            format!(
                                "scheme '{}' not supported, must be http or https",
                                parsed.scheme()
                            ),
                            "use format like https://example.com",
                        );
                    }
                    if parsed.host_str().is_none() {
                        diag.error_with_hint(
                            Self::FIELDS.url,
                            "URL must have a valid host",
                            "use format like https://example.com",
                        );
                    }
                }
                Err(e) => {
                    diag.error_with_hint(
                        Self::FIELDS.url,
                        format!("invalid URL: {}", e),
                        "use format like https://example.com",
                    );
                }
            }
        }

        if self.root.as_os_str().is_empty() {
            diag.error(Self::FIELDS.root, "document root is not configured");
        } else if !self.root.is_dir() {
            diag.error(
                Self::FIELDS.root,
                format!("`{}` is not a directory", self.root.display()),
            );
        }
    }
}
