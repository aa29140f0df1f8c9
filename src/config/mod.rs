//! Configuration for `cloak.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── site       # [site]
//! │   ├── cache      # [cache]
//! │   └── protect    # [protect]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   └── field      # FieldPath
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! # Example
//!
//! ```toml
//! verbose = false
//!
//! [site]
//! url = "https://example.com"
//! root = "/var/www/html"
//!
//! [cache]
//! dir = "wp-content/uploads/assets"
//!
//! [protect]
//! deny = ["wp-content/"]
//! ```

pub mod section;
pub mod types;

pub use section::{CacheSectionConfig, ProtectSectionConfig, SiteSectionConfig};
pub use types::{ConfigDiagnostic, ConfigDiagnostics, ConfigError, FieldPath};

use std::fs;
use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use url::Url;

/// Characters escaped in a derived cache URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing cloak.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Enable debug logging
    #[serde(default)]
    pub verbose: bool,

    /// Site URL and document root
    #[serde(default)]
    pub site: SiteSectionConfig,

    /// Cache location
    #[serde(default)]
    pub cache: CacheSectionConfig,

    /// Cache directory policy
    #[serde(default)]
    pub protect: ProtectSectionConfig,
}

impl SiteConfig {
    /// Minimal configuration for a site served from `root`.
    pub fn new(url: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            site: SiteSectionConfig {
                url: url.into(),
                root: root.into(),
            },
            ..Self::default()
        }
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load, finalize and validate a config file.
    ///
    /// Relative paths in the file are resolved against its directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;

        config.config_path = crate::utils::path::normalize_path(path);
        let base = config
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.finalize(&base);
        config.validate()?;
        Ok(config)
    }

    /// Resolve relative paths: `site.root` against `base`, `cache.dir`
    /// against the document root.
    pub fn finalize(&mut self, base: &Path) {
        self.site.normalize(base);
        self.cache.normalize(&self.site.root);
    }

    /// Validate all sections, collecting every error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut diag = ConfigDiagnostics::new();

        self.site.validate(&mut diag);
        self.cache.validate(&mut diag);
        self.protect.validate(&mut diag);

        diag.into_result().map_err(ConfigError::Validation)
    }

    /// Get the document root
    pub fn get_root(&self) -> &Path {
        &self.site.root
    }

    /// Parsed site URL.
    pub fn site_url(&self) -> Result<Url, ConfigError> {
        self.site.parsed_url().ok_or_else(|| {
            let mut diag = ConfigDiagnostics::new();
            diag.error(SiteSectionConfig::FIELDS.url, "not an absolute http(s) URL");
            ConfigError::Validation(diag)
        })
    }

    /// Public URL of the cache directory, without trailing slash.
    ///
    /// An explicit `cache.url` wins (root-relative values are joined onto
    /// the site URL). Otherwise the cache directory's position below the
    /// document root is appended to the site URL.
    pub fn cache_url(&self) -> Result<String, ConfigError> {
        let site = self.site_url()?;

        if let Some(url) = &self.cache.url {
            let joined = site.join(url).map_err(|e| {
                let mut diag = ConfigDiagnostics::new();
                diag.error(CacheSectionConfig::FIELDS.url, format!("invalid URL: {e}"));
                ConfigError::Validation(diag)
            })?;
            return Ok(joined.as_str().trim_end_matches('/').to_string());
        }

        let root = crate::utils::path::normalize_path(self.get_root());
        let dir = crate::utils::path::normalize_path(&self.cache.dir);
        let relative = dir.strip_prefix(&root).map_err(|_| {
            let mut diag = ConfigDiagnostics::new();
            diag.error_with_hint(
                CacheSectionConfig::FIELDS.url,
                "cache directory lies outside the document root",
                "set cache.url to the URL the directory is served at",
            );
            ConfigError::Validation(diag)
        })?;

        let segments: Vec<String> = relative
            .components()
            .map(|c| utf8_percent_encode(&c.as_os_str().to_string_lossy(), SEGMENT).to_string())
            .collect();

        Ok(format!(
            "{}/{}",
            site.as_str().trim_end_matches('/'),
            segments.join("/")
        )
        .trim_end_matches('/')
        .to_string())
    }
}

// ============================================================================
// tests
// ============================================================================
