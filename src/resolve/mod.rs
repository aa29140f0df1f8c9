//! Asset URL → canonical local path.
//!
//! A URL is eligible only when it names an existing regular file below the
//! document root and is served by the site's own host. Rejections are
//! routing decisions, not failures: callers keep the original URL.

mod link;

pub use link::LinkKind;

use std::io;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

use crate::asset::AssetKind;

/// Why a URL is not eligible for caching.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Ineligible {
    #[error("empty url")]
    Empty,
    #[error("not an http(s) url")]
    UnsupportedScheme,
    #[error("page-relative url")]
    PageRelative,
    #[error("malformed url")]
    Malformed,
    #[error("foreign host `{0}`")]
    ForeignHost(String),
    #[error("outside the site path")]
    OutsideSite,
    #[error("no such file")]
    NotFound,
    #[error("not a regular file")]
    NotAFile,
    #[error("escapes the document root")]
    OutsideRoot,
    #[error("hidden path segment")]
    Hidden,
    #[error("not a static file format")]
    UnsafeFormat,
    #[error("{found} file referenced as {expected}")]
    KindMismatch { expected: AssetKind, found: AssetKind },
    #[error("already served from the cache")]
    AlreadyCached,
}

/// Maps asset URLs onto files under the document root.
#[derive(Debug, Clone)]
pub struct PathResolver {
    /// Site URL, base for scheme- and root-relative references
    site: Url,
    /// Lowercase site host
    host: String,
    /// Site path prefix without trailing slash ("" when served at `/`)
    base_path: String,
    /// Canonical document root
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver for `site`, serving files from `root`.
    ///
    /// Fails when the document root does not exist.
    pub fn new(site: Url, root: &Path) -> io::Result<Self> {
        let root = root.canonicalize()?;
        let host = site
            .host_str()
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "site url has no host"))?;
        let base_path = percent_decode_str(site.path())
            .decode_utf8_lossy()
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            site,
            host,
            base_path,
            root,
        })
    }

    /// Host the site is served from.
    pub fn site_host(&self) -> &str {
        &self.host
    }

    /// Canonical document root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Cheap eligibility filter: does `url` point at this site?
    ///
    /// Does not touch the filesystem.
    pub fn is_local(&self, url: &str) -> bool {
        self.site_relative_path(url).is_ok()
    }

    /// Resolve `url` to a canonical file path under the document root.
    pub fn resolve(&self, url: &str) -> Result<PathBuf, Ineligible> {
        let relative = self.site_relative_path(url)?;
        if relative.is_empty() {
            return Err(Ineligible::NotAFile);
        }

        let canonical = self
            .root
            .join(&relative)
            .canonicalize()
            .map_err(|_| Ineligible::NotFound)?;

        let inner = canonical
            .strip_prefix(&self.root)
            .map_err(|_| Ineligible::OutsideRoot)?;
        if inner.components().any(|c| is_hidden(&c.as_os_str().to_string_lossy())) {
            return Err(Ineligible::Hidden);
        }
        if !canonical.is_file() {
            return Err(Ineligible::NotAFile);
        }

        Ok(canonical)
    }

    /// Decoded URL path relative to the site base, without leading slash.
    fn site_relative_path(&self, url: &str) -> Result<String, Ineligible> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Ineligible::Empty);
        }

        let link = LinkKind::parse(url);
        if !link.may_be_local() {
            return Err(match link {
                LinkKind::External(_) => Ineligible::UnsupportedScheme,
                _ => Ineligible::PageRelative,
            });
        }

        let joined = self.site.join(url).map_err(|_| Ineligible::Malformed)?;
        match joined.host_str() {
            Some(host) if host.eq_ignore_ascii_case(&self.host) => {}
            Some(host) => return Err(Ineligible::ForeignHost(host.to_string())),
            None => return Err(Ineligible::Malformed),
        }

        let decoded = percent_decode_str(joined.path())
            .decode_utf8()
            .map_err(|_| Ineligible::Malformed)?;

        let rest = decoded
            .strip_prefix(self.base_path.as_str())
            .filter(|rest| rest.is_empty() || rest.starts_with('/'))
            .ok_or(Ineligible::OutsideSite)?;

        let rest = rest.trim_start_matches('/');
        if rest.split('/').any(is_hidden) {
            return Err(Ineligible::Hidden);
        }
        Ok(rest.to_string())
    }
}

/// Dotfiles and dot-directories (`.env`, `.git/`) are never served.
fn is_hidden(segment: &str) -> bool {
    segment.starts_with('.') && segment != "." && segment != ".."
}
