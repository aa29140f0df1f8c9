//! Cache directory bootstrap.
//!
//! Creates the cache directory and writes its `.htaccess` policy: no
//! directory listings, configured internal prefixes answered with 403,
//! long-lived `Cache-Control` for static files and the map file hidden.
//! Runs once when a [`Cloak`](crate::Cloak) is built. Failures degrade
//! protection but never stop page serving.

use std::fs;
use std::path::Path;

use crate::config::ProtectSectionConfig;
use crate::utils::path::{file_content_matches, write_atomic};
use crate::{debug, log};

/// Policy file name inside the cache directory.
pub const POLICY_FILE: &str = ".htaccess";

/// Outcome of the policy file step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyStatus {
    Written,
    Unchanged,
    Disabled,
    Failed,
}

/// What the bootstrap managed to set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtectionReport {
    pub cache_dir: bool,
    pub policy: PolicyStatus,
}

impl ProtectionReport {
    /// Check if everything that was asked for is in place.
    pub fn is_complete(&self) -> bool {
        self.cache_dir && self.policy != PolicyStatus::Failed
    }
}

/// Ensure `cache_dir` exists and carries the configured policy file.
pub fn ensure_protection(
    cache_dir: &Path,
    config: &ProtectSectionConfig,
    map_file: &str,
) -> ProtectionReport {
    if let Err(e) = fs::create_dir_all(cache_dir) {
        log!("protect"; "cannot create {}: {}", cache_dir.display(), e);
        return ProtectionReport {
            cache_dir: false,
            policy: if config.enable {
                PolicyStatus::Failed
            } else {
                PolicyStatus::Disabled
            },
        };
    }

    if !config.enable {
        return ProtectionReport {
            cache_dir: true,
            policy: PolicyStatus::Disabled,
        };
    }

    let path = cache_dir.join(POLICY_FILE);
    let policy = render_policy(config, map_file);
    let status = if file_content_matches(&path, policy.as_bytes()) {
        PolicyStatus::Unchanged
    } else {
        match write_atomic(&path, policy.as_bytes()) {
            Ok(()) => {
                debug!("protect"; "wrote {}", path.display());
                PolicyStatus::Written
            }
            Err(e) => {
                log!("protect"; "cannot write {}: {}", path.display(), e);
                PolicyStatus::Failed
            }
        }
    };

    ProtectionReport {
        cache_dir: true,
        policy: status,
    }
}

/// Render the Apache policy file.
pub fn render_policy(config: &ProtectSectionConfig, map_file: &str) -> String {
    let mut out = String::from("# Generated by cloak. Local changes are overwritten.\n");
    out.push_str("Options -Indexes\n");

    let prefixes: Vec<&str> = config
        .deny
        .iter()
        .map(|p| p.trim_start_matches('/'))
        .filter(|p| !p.is_empty())
        .collect();
    if !prefixes.is_empty() {
        out.push_str("\n<IfModule mod_rewrite.c>\nRewriteEngine On\n");
        for prefix in prefixes {
            out.push_str(&format!("RewriteRule ^{} - [F]\n", regex::escape(prefix)));
        }
        out.push_str("</IfModule>\n");
    }

    if !config.extensions.is_empty() && !config.cache_control.is_empty() {
        let extensions = config
            .extensions
            .iter()
            .map(|e| e.to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join("|");
        out.push_str(&format!(
            "\n<FilesMatch \"\\.({extensions})$\">\n\
             <IfModule mod_headers.c>\n\
             Header set Cache-Control \"{}\"\n\
             </IfModule>\n\
             </FilesMatch>\n",
            config.cache_control
        ));
    }

    out.push_str(&format!(
        "\n<Files \"{map_file}\">\nRequire all denied\n</Files>\n"
    ));
    out
}
