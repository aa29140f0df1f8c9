//! Request-scoped state: the URL memo and the map persist guard.
//!
//! One `RequestContext` is created per request/response cycle and dropped
//! with it. Nothing in here outlives the request or is shared between
//! workers.

use std::cell::Cell;

use rustc_hash::FxHashMap;

use crate::asset::AssetKind;

/// (kind, source URL) → cached URL, for URLs already resolved in this
/// request.
///
/// Keyed by kind as well: the same URL referenced as a script and as a
/// stylesheet must not share an answer.
#[derive(Debug, Default)]
pub struct RuntimeMemo {
    urls: FxHashMap<AssetKind, FxHashMap<String, String>>,
}

impl RuntimeMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached URL previously stored for `url` as `kind`.
    #[inline]
    pub fn lookup(&self, kind: &AssetKind, url: &str) -> Option<&str> {
        self.urls.get(kind)?.get(url).map(String::as_str)
    }

    /// Remember the cached URL for `url` as `kind`.
    #[inline]
    pub fn store(&mut self, kind: &AssetKind, url: impl Into<String>, cached: impl Into<String>) {
        self.urls
            .entry(kind.clone())
            .or_default()
            .insert(url.into(), cached.into());
    }

    pub fn len(&self) -> usize {
        self.urls.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// State carried through every call made on behalf of one request.
#[derive(Debug, Default)]
pub struct RequestContext {
    memo: RuntimeMemo,
    /// Set while this request is writing the cache map
    persisting: Cell<bool>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memo(&self) -> &RuntimeMemo {
        &self.memo
    }

    pub fn memo_mut(&mut self) -> &mut RuntimeMemo {
        &mut self.memo
    }

    /// Enter a map save. Returns `None` if a save is already in flight
    /// for this request; the guard clears the flag when dropped.
    pub fn enter_persist(&self) -> Option<PersistGuard<'_>> {
        if self.persisting.replace(true) {
            return None;
        }
        Some(PersistGuard {
            flag: &self.persisting,
        })
    }

    /// Check if a map save is in flight for this request.
    pub fn is_persisting(&self) -> bool {
        self.persisting.get()
    }
}

/// Marks a map save in flight; resets the flag on drop (including unwinds).
#[derive(Debug)]
pub struct PersistGuard<'a> {
    flag: &'a Cell<bool>,
}

impl Drop for PersistGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memo_lookup_store() {
        let mut memo = RuntimeMemo::new();
        assert!(memo.lookup(&AssetKind::Stylesheet, "/a.css").is_none());

        memo.store(&AssetKind::Stylesheet, "/a.css", "/cache/css/0123.css");
        assert_eq!(
            memo.lookup(&AssetKind::Stylesheet, "/a.css"),
            Some("/cache/css/0123.css")
        );
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn test_memo_is_keyed_by_kind() {
        let mut memo = RuntimeMemo::new();
        memo.store(&AssetKind::Stylesheet, "/loader", "/cache/css/0123.css");
        assert!(memo.lookup(&AssetKind::Script, "/loader").is_none());

        memo.store(&AssetKind::Script, "/loader", "/cache/js/0123.js");
        assert_eq!(memo.len(), 2);
        assert_eq!(
            memo.lookup(&AssetKind::Script, "/loader"),
            Some("/cache/js/0123.js")
        );
    }

    #[test]
    fn test_fresh_context_has_empty_memo() {
        let mut first = RequestContext::new();
        first
            .memo_mut()
            .store(&AssetKind::Script, "/a.js", "/cache/js/1.js");

        let second = RequestContext::new();
        assert!(second.memo().is_empty());
    }

    #[test]
    fn test_persist_guard_blocks_nested_save() {
        let ctx = RequestContext::new();
        {
            let outer = ctx.enter_persist();
            assert!(outer.is_some());
            assert!(ctx.is_persisting());
            assert!(ctx.enter_persist().is_none());
        }
        assert!(!ctx.is_persisting());
        assert!(ctx.enter_persist().is_some());
    }
}
