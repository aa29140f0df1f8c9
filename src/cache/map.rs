//! Persistent key → cached-file mapping (`map.json`).
//!
//! The whole map is rewritten on every save. Entries are sorted so two
//! processes saving the same set of entries write identical bytes.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::CacheError;
use crate::identity::ContentKey;
use crate::utils::path::{file_content_matches, write_atomic};

/// Default map file name (inside the cache directory)
pub const MAP_FILE: &str = "map.json";

/// On-disk format version
const MAP_VERSION: u32 = 1;

/// One cached file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Path relative to the cache root, always `/`-separated (`css/0123abcd.css`)
    pub path: String,
    /// Canonical source path the copy was taken from
    pub source: PathBuf,
    /// Creation time (Unix timestamp in seconds)
    #[serde(default)]
    pub created_at: u64,
}

impl CacheEntry {
    pub fn new(path: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            created_at: current_timestamp(),
        }
    }

    /// Check if the cached file lives directly in `bucket`.
    pub fn in_bucket(&self, bucket: &str) -> bool {
        self.path
            .split_once('/')
            .is_some_and(|(dir, name)| dir == bucket && !name.contains('/'))
    }

    /// Check that `path` is a plain `<bucket>/<file>` below the cache root.
    fn is_contained(&self) -> bool {
        let mut segments = self.path.split('/');
        let valid = |s: &str| {
            !s.is_empty() && !s.starts_with('.') && !s.contains(['\\', ':'])
        };
        matches!(
            (segments.next(), segments.next(), segments.next()),
            (Some(dir), Some(name), None) if valid(dir) && valid(name)
        )
    }
}

/// Serialized form of the map
#[derive(Debug, Default, Serialize, Deserialize)]
struct MapFile {
    #[serde(default)]
    version: u32,
    #[serde(default)]
    entries: BTreeMap<ContentKey, CacheEntry>,
}

/// In-memory map plus its backing file.
#[derive(Debug)]
pub struct CacheMap {
    entries: DashMap<ContentKey, CacheEntry>,
    path: PathBuf,
    /// Serializes saves within this process
    save_lock: Mutex<()>,
}

impl CacheMap {
    /// Empty map backed by `path` (nothing is read).
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            entries: DashMap::new(),
            path: path.into(),
            save_lock: Mutex::new(()),
        }
    }

    /// Load the map from `path`. A missing file yields an empty map.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let map = Self::empty(path);
        if let Some(file) = read_map_file(&map.path)? {
            for (key, entry) in file.entries {
                map.entries.insert(key, entry);
            }
        }
        crate::debug!("cache"; "loaded {} map entries from {}", map.len(), map.path.display());
        Ok(map)
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &ContentKey) -> Option<CacheEntry> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    pub fn contains(&self, key: &ContentKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Record an entry.
    ///
    /// Keys are deterministic in their value, so replacing an entry only
    /// ever refreshes its metadata (after a read repair).
    pub fn insert(&self, key: ContentKey, entry: CacheEntry) {
        self.entries.insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sorted copy of all entries.
    pub fn snapshot(&self) -> BTreeMap<ContentKey, CacheEntry> {
        self.entries
            .iter()
            .map(|e| (*e.key(), e.value().clone()))
            .collect()
    }

    /// Drop every entry from memory (the file is left alone).
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Persist the whole map.
    ///
    /// Entries saved meanwhile by other processes are merged in first, which
    /// narrows (but cannot close) the lost-update window between processes.
    pub fn save(&self) -> Result<(), CacheError> {
        let _lock = self.save_lock.lock();

        match read_map_file(&self.path) {
            Ok(Some(on_disk)) => {
                for (key, entry) in on_disk.entries {
                    self.entries.entry(key).or_insert(entry);
                }
            }
            Ok(None) => {}
            Err(e) => crate::log!("cache"; "ignoring unreadable map on save: {}", e),
        }

        let file = MapFile {
            version: MAP_VERSION,
            entries: self.snapshot(),
        };
        let json = serde_json::to_string_pretty(&file)?;

        if file_content_matches(&self.path, json.as_bytes()) {
            crate::debug!("cache"; "map unchanged, skipping write");
            return Ok(());
        }

        write_atomic(&self.path, json.as_bytes()).map_err(|source| CacheError::WriteFailure {
            path: self.path.clone(),
            source,
        })?;
        crate::debug!("cache"; "saved {} map entries", file.entries.len());
        Ok(())
    }

    /// Remove the backing file and all in-memory entries.
    pub fn remove(&self) -> io::Result<()> {
        let _lock = self.save_lock.lock();
        self.entries.clear();
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Read and parse a map file; `Ok(None)` if it does not exist.
fn read_map_file(path: &Path) -> Result<Option<MapFile>, CacheError> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(CacheError::SourceUnreadable {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let mut file: MapFile =
        serde_json::from_str(&json).map_err(|source| CacheError::MapCorrupt {
            path: path.to_path_buf(),
            source,
        })?;

    file.entries.retain(|key, entry| {
        let keep = entry.is_contained();
        if !keep {
            crate::log!("cache"; "dropping map entry {} with unsafe path `{}`", key, entry.path);
        }
        keep
    });
    Ok(Some(file))
}

/// Get current Unix timestamp in seconds
fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
