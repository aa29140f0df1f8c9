//! `[protect]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [protect]
//! enable = true
//! deny = ["wp-content/"]       # path prefixes answered with 403
//! cache_control = "public, max-age=31536000, immutable"
//! extensions = ["css", "js", "png"]
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Field paths of `[protect]`, for diagnostics.
pub struct ProtectFields {
    pub deny: FieldPath,
    pub cache_control: FieldPath,
    pub extensions: FieldPath,
}

/// Directory policy written into the cache directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtectSectionConfig {
    /// Write the policy file at all.
    pub enable: bool,

    /// Internal path prefixes that must never be served.
    pub deny: Vec<String>,

    /// `Cache-Control` value for cached static files.
    pub cache_control: String,

    /// Extensions the `Cache-Control` header applies to.
    pub extensions: Vec<String>,
}

impl Default for ProtectSectionConfig {
    fn default() -> Self {
        Self {
            enable: true,
            deny: vec!["wp-content/".into()],
            cache_control: "public, max-age=31536000, immutable".into(),
            extensions: [
                "css", "js", "png", "jpg", "jpeg", "gif", "webp", "avif", "svg", "ico", "woff",
                "woff2",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl ProtectSectionConfig {
    pub const FIELDS: ProtectFields = ProtectFields {
        deny: FieldPath::new("protect.deny"),
        cache_control: FieldPath::new("protect.cache_control"),
        extensions: FieldPath::new("protect.extensions"),
    };

    /// Validate protection configuration (only when enabled).
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.enable {
            return;
        }

        if self.deny.iter().any(|p| p.trim_matches('/').is_empty()) {
            diag.error_with_hint(
                Self::FIELDS.deny,
                "empty prefix would deny the whole cache",
                "remove the entry or name a directory, e.g. \"wp-content/\"",
            );
        }

        if self.cache_control.contains(['\n', '\r', '"']) {
            diag.error(
                Self::FIELDS.cache_control,
                "must be a single header value without quotes",
            );
        }

        if let Some(bad) = self
            .extensions
            .iter()
            .find(|e| e.is_empty() || !e.chars().all(|c| c.is_ascii_alphanumeric()))
        {
            diag.error_with_hint(
                Self::FIELDS.extensions,
                format!("`{bad}` is not a plain file extension"),
                "list extensions without the dot, e.g. \"css\"",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let mut diag = ConfigDiagnostics::new();
        ProtectSectionConfig::default().validate(&mut diag);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_invalid_entries() {
        let section = ProtectSectionConfig {
            deny: vec!["/".into()],
            cache_control: "public\nX-Evil: 1".into(),
            extensions: vec![".css".into()],
            ..Default::default()
        };
        let mut diag = ConfigDiagnostics::new();
        section.validate(&mut diag);
        assert_eq!(diag.len(), 3);
    }

    #[test]
    fn test_disabled_skips_validation() {
        let section = ProtectSectionConfig {
            enable: false,
            deny: vec!["".into()],
            ..Default::default()
        };
        let mut diag = ConfigDiagnostics::new();
        section.validate(&mut diag);
        assert!(diag.is_empty());
    }
}
