//! Content-addressed asset cache.
//!
//! `CacheStore` owns the cache directory and its map, and implements the
//! read-through / copy-on-miss protocol:
//!
//! 1. resolve the source URL to a file under the document root
//! 2. check the file's own format against the requested kind
//! 3. derive the identity key from path + mtime
//! 4. hit: the mapped file exists in the kind's bucket, return its public URL
//! 5. miss (or stale entry): copy the source into `<bucket>/<short>.<ext>`,
//!    record the entry, persist the map, return the new URL
//!
//! Everything on this path is best effort. `cached_url` never fails; it
//! returns `None` and the caller keeps the original URL.

mod error;
mod map;


pub use error::CacheError;
pub use map::{CacheEntry, CacheMap, MAP_FILE};

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use jwalk::WalkDir;
use rustc_hash::FxHashSet;

use crate::asset::{AssetKind, source_kind};
use crate::context::RequestContext;
use crate::identity::{ContentKey, identity_key};
use crate::resolve::{Ineligible, PathResolver};
use crate::utils::path::{normalize_path, write_atomic};
use crate::{debug, log};

/// A resolved cache location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAsset {
    pub key: ContentKey,
    /// Path relative to the cache root
    pub path: String,
    /// Public URL of the cached copy
    pub url: String,
    /// Whether this call wrote the file
    pub created: bool,
}

/// Counters for cache activity since the store was opened.
#[derive(Debug, Default)]
struct CacheStats {
    hits: AtomicUsize,
    misses: AtomicUsize,
    writes: AtomicUsize,
    repairs: AtomicUsize,
}

/// Point-in-time copy of the cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub hits: usize,
    pub misses: usize,
    /// Cache files written
    pub writes: usize,
    /// Stale entries whose file had vanished and was regenerated
    pub repairs: usize,
}

/// Owner of the cache directory and the key → path map.
#[derive(Debug)]
pub struct CacheStore {
    resolver: PathResolver,
    /// Cache directory (canonical when it exists)
    root: PathBuf,
    /// Public URL of the cache directory, without trailing slash
    base_url: String,
    map: CacheMap,
    stats: CacheStats,
}

impl CacheStore {
    /// Open the cache at `root`, loading its map.
    ///
    /// A corrupt map is logged and replaced by an empty one; its entries are
    /// recomputed on demand.
    pub fn open(
        resolver: PathResolver,
        root: impl AsRef<Path>,
        base_url: impl Into<String>,
        map_file: &str,
    ) -> Self {
        let root = normalize_path(root.as_ref());
        let map_path = root.join(map_file);
        let map = CacheMap::load(&map_path).unwrap_or_else(|e| {
            log!("cache"; "{}, starting with an empty map", e);
            CacheMap::empty(&map_path)
        });

        Self {
            resolver,
            root,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            map,
            stats: CacheStats::default(),
        }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn map(&self) -> &CacheMap {
        &self.map
    }

    /// Sorted snapshot of every map entry.
    pub fn entries(&self) -> BTreeMap<ContentKey, CacheEntry> {
        self.map.snapshot()
    }

    /// Cheap check: does `url` point at this site at all?
    pub fn should_process(&self, url: &str) -> bool {
        self.resolver.is_local(url)
    }

    /// Cached URL for `source_url`, creating the cached copy if needed.
    ///
    /// Returns `None` when the URL is ineligible or caching failed; the
    /// caller must then keep the original URL.
    pub fn cached_url(
        &self,
        source_url: &str,
        kind: &AssetKind,
        ctx: &mut RequestContext,
    ) -> Option<String> {
        if let Some(hit) = ctx.memo().lookup(kind, source_url) {
            return Some(hit.to_string());
        }

        match self.try_cached_url(source_url, kind, ctx) {
            Ok(asset) => {
                ctx.memo_mut().store(kind, source_url, asset.url.as_str());
                Some(asset.url)
            }
            Err(e) if e.is_ineligible() => {
                debug!("cache"; "skip {}: {}", source_url, e);
                None
            }
            Err(e) => {
                log!("cache"; "{}: {}", source_url, e);
                None
            }
        }
    }

    /// Like [`cached_url`](Self::cached_url) but reports why nothing was
    /// cached. Bypasses the request memo.
    pub fn try_cached_url(
        &self,
        source_url: &str,
        kind: &AssetKind,
        ctx: &RequestContext,
    ) -> Result<CachedAsset, CacheError> {
        let source = self.resolver.resolve(source_url)?;
        if source.starts_with(&self.root) {
            return Err(Ineligible::AlreadyCached.into());
        }
        self.cache_file(&source, kind, ctx)
    }

    /// Get or create the cached copy of an already resolved source file.
    ///
    /// The file must carry a static-format extension whose kind is `kind`.
    pub fn cache_file(
        &self,
        source: &Path,
        kind: &AssetKind,
        ctx: &RequestContext,
    ) -> Result<CachedAsset, CacheError> {
        let found = source_kind(source).ok_or(Ineligible::UnsafeFormat)?;
        if found != *kind {
            return Err(Ineligible::KindMismatch {
                expected: kind.clone(),
                found,
            }
            .into());
        }

        let key = identity_key(source).map_err(|e| CacheError::SourceUnreadable {
            path: source.to_path_buf(),
            source: e,
        })?;

        if let Some(entry) = self.map.get(&key) {
            if !entry.in_bucket(kind.bucket()) {
                debug!("cache"; "entry {} ({}) is not in `{}`, replacing", key, entry.path, kind.bucket());
            } else if self.root.join(&entry.path).is_file() {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(CachedAsset {
                    key,
                    url: self.public_url(&entry.path),
                    path: entry.path,
                    created: false,
                });
            } else {
                self.stats.repairs.fetch_add(1, Ordering::Relaxed);
                debug!("cache"; "stale entry {} ({}), regenerating", key, entry.path);
            }
        }

        self.materialize(source, key, kind, ctx)
    }

    /// Copy `source` into the cache and record it.
    fn materialize(
        &self,
        source: &Path,
        key: ContentKey,
        kind: &AssetKind,
        ctx: &RequestContext,
    ) -> Result<CachedAsset, CacheError> {
        self.stats.misses.fetch_add(1, Ordering::Relaxed);

        let content = fs::read(source).map_err(|e| CacheError::SourceUnreadable {
            path: source.to_path_buf(),
            source: e,
        })?;

        let path = relative_cache_path(&key, kind, source);
        let target = self.root.join(&path);
        write_atomic(&target, &content).map_err(|e| CacheError::WriteFailure {
            path: target.clone(),
            source: e,
        })?;
        self.stats.writes.fetch_add(1, Ordering::Relaxed);
        debug!("cache"; "{} -> {}", source.display(), path);

        self.map.insert(key, CacheEntry::new(path.as_str(), source));
        // The copy is usable even if the map could not be saved; the entry
        // is simply recomputed after a restart.
        if let Err(e) = self.persist(ctx) {
            log!("cache"; "failed to persist map: {}", e);
        }

        Ok(CachedAsset {
            key,
            url: self.public_url(&path),
            path,
            created: true,
        })
    }

    /// Save the map, unless this request is already saving it.
    pub fn persist(&self, ctx: &RequestContext) -> Result<(), CacheError> {
        let Some(_guard) = ctx.enter_persist() else {
            debug!("cache"; "map save already in flight, skipping nested save");
            return Ok(());
        };
        self.map.save()
    }

    /// Public URL for a cache-relative path.
    pub fn public_url(&self, relative: &str) -> String {
        format!("{}/{}", self.base_url, relative)
    }

    /// Current activity counters.
    pub fn stats(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            writes: self.stats.writes.load(Ordering::Relaxed),
            repairs: self.stats.repairs.load(Ordering::Relaxed),
        }
    }

    /// Delete cached files that no map entry references.
    ///
    /// Superseded copies (older mtimes of the same source) stay referenced
    /// and are kept; only orphans, e.g. from a lost map update, are removed.
    pub fn prune(&self) -> io::Result<usize> {
        let referenced: FxHashSet<PathBuf> = self
            .map
            .snapshot()
            .values()
            .map(|entry| self.root.join(&entry.path))
            .collect();

        let orphans: Vec<PathBuf> = WalkDir::new(&self.root)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path())
            .filter(|path| !referenced.contains(path))
            .collect();

        let mut removed = 0;
        for path in orphans {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => log!("cache"; "failed to prune {}: {}", path.display(), e),
            }
        }
        debug!("cache"; "pruned {} orphaned files", removed);
        Ok(removed)
    }

    /// Remove every cached file and the map. The policy file is kept.
    pub fn clear(&self) -> io::Result<()> {
        self.map.remove()?;
        if !self.root.is_dir() {
            return Ok(());
        }
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            }
        }
        Ok(())
    }
}

/// `<bucket>/<short key>.<ext>`
fn relative_cache_path(key: &ContentKey, kind: &AssetKind, source: &Path) -> String {
    format!(
        "{}/{}.{}",
        kind.bucket(),
        key.short(),
        kind.cache_extension(source)
    )
}
