//! Filesystem path helpers.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Resolve a path relative to `base` unless it is already absolute.
#[inline]
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Check if file content is the same as new content
pub fn file_content_matches(path: &Path, content: &[u8]) -> bool {
    path.is_file() && fs::read(path).is_ok_and(|existing| existing == content)
}

/// Distinguishes temp files written by concurrent threads of one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `bytes` to `path` through a hidden temporary sibling and a rename.
///
/// Readers never observe a half-written file. Parent directories are
/// created as needed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let tmp = temp_sibling(path);
    if let Err(e) = fs::write(&tmp, bytes) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file");
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    path.with_file_name(format!(".{name}.{}.{seq}.tmp", std::process::id()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            resolve_path(Path::new("/absolute/path"), Path::new("/base")),
            PathBuf::from("/absolute/path")
        );
        assert_eq!(
            resolve_path(Path::new("cache/assets"), Path::new("/var/www")),
            PathBuf::from("/var/www/cache/assets")
        );
    }

    #[test]
    fn test_write_atomic_creates_parents() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("css").join("a.css");

        write_atomic(&target, b"body {}").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"body {}");
        // No temp files left behind
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("css"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_write_atomic_replaces() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("map.json");
        write_atomic(&target, b"{}").unwrap();
        write_atomic(&target, b"{\"a\":1}").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"{\"a\":1}");
    }

    #[test]
    fn test_file_content_matches() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy");
        assert!(!file_content_matches(&path, b"x"));
        fs::write(&path, "x").unwrap();
        assert!(file_content_matches(&path, b"x"));
        assert!(!file_content_matches(&path, b"y"));
    }
}
