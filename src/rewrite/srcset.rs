//! Responsive image sets (`srcset` attribute values).

use crate::asset::AssetKind;
use crate::cache::CacheStore;
use crate::context::RequestContext;

use super::attr::try_rewrite;

/// One `srcset` candidate: a URL plus an optional width/density descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrcsetCandidate {
    pub url: String,
    /// `480w`, `2x`, or empty
    pub descriptor: String,
}

impl SrcsetCandidate {
    pub fn new(url: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            descriptor: descriptor.into(),
        }
    }
}

/// Split a `srcset` value into candidates.
///
/// Candidates are comma separated; within a candidate the URL ends at the
/// first whitespace. Empty candidates are dropped.
pub fn parse_srcset(value: &str) -> Vec<SrcsetCandidate> {
    value
        .split(',')
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            let (url, descriptor) = part
                .split_once(char::is_whitespace)
                .map(|(u, d)| (u, d.trim()))
                .unwrap_or((part, ""));
            Some(SrcsetCandidate::new(url, descriptor))
        })
        .collect()
}

/// Serialize candidates back into a `srcset` value.
pub fn format_srcset(candidates: &[SrcsetCandidate]) -> String {
    candidates
        .iter()
        .map(|c| {
            if c.descriptor.is_empty() {
                c.url.clone()
            } else {
                format!("{} {}", c.url, c.descriptor)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rewrite each candidate's URL independently. Returns how many changed.
pub fn rewrite_srcset(
    store: &CacheStore,
    ctx: &mut RequestContext,
    candidates: &mut [SrcsetCandidate],
) -> usize {
    let mut rewritten = 0;
    for candidate in candidates.iter_mut() {
        if let Some(url) = try_rewrite(store, ctx, &candidate.url, Some(&AssetKind::Image)) {
            candidate.url = url;
            rewritten += 1;
        }
    }
    rewritten
}

/// Rewrite a raw `srcset` attribute value.
///
/// The input is returned untouched (formatting included) when no candidate
/// was rewritten.
pub fn rewrite_srcset_attr(store: &CacheStore, ctx: &mut RequestContext, value: &str) -> String {
    let mut candidates = parse_srcset(value);
    if rewrite_srcset(store, ctx, &mut candidates) == 0 {
        return value.to_string();
    }
    format_srcset(&candidates)
}
