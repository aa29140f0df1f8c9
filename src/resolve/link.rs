//! Syntactic link classification, before any URL parsing.

use crate::utils::path::route::is_external_link;

/// Syntactic classification of an asset reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind<'a> {
    /// Absolute URL with a scheme (https://, data:, mailto:, ...)
    External(&'a str),
    /// Scheme-relative URL (//host/path).
    SchemeRelative(&'a str),
    /// Site-root-relative path (/style.css).
    SiteRoot(&'a str),
    /// Pure fragment link (#section).
    Fragment(&'a str),
    /// Page-relative path (style.css, ./a.png, ../b.js).
    FileRelative(&'a str),
}

impl<'a> LinkKind<'a> {
    /// Parse a link string into its syntactic kind.
    #[inline]
    pub fn parse(link: &'a str) -> Self {
        if is_external_link(link) {
            Self::External(link)
        } else if link.starts_with("//") {
            Self::SchemeRelative(link)
        } else if link.starts_with('/') {
            Self::SiteRoot(link)
        } else if let Some(anchor) = link.strip_prefix('#') {
            Self::Fragment(anchor)
        } else {
            Self::FileRelative(link)
        }
    }

    /// Check if link is HTTP/HTTPS.
    #[inline]
    pub fn is_http(link: &str) -> bool {
        let lower = link.get(..8).unwrap_or(link).to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    /// Check if the link can possibly name a file on this site.
    ///
    /// Host comparison happens later, after parsing.
    pub fn may_be_local(&self) -> bool {
        match self {
            Self::External(link) => Self::is_http(link),
            Self::SchemeRelative(_) | Self::SiteRoot(_) => true,
            Self::Fragment(_) | Self::FileRelative(_) => false,
        }
    }
}
