//! Cache identity for source files: blake3 over path and modification time.
//!
//! Two calls with the same canonical path and the same mtime yield the same
//! key. Touching a file advances its mtime and therefore its key, so cached
//! copies are invalidated without any explicit cache-busting step.

use std::fs;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Number of hex characters used for cached filenames.
const SHORT_LEN: usize = 16;

/// A 256-bit cache key (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentKey([u8; 32]);

impl ContentKey {
    /// Create a new ContentKey from raw bytes.
    #[inline]
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string.
    pub fn from_hex(s: &str) -> Option<Self> {
        let bytes = hex::decode(s).ok()?;
        let arr: [u8; 32] = bytes.try_into().ok()?;
        Some(Self(arr))
    }

    /// Filename stem for the cached copy (first 16 hex chars).
    pub fn short(&self) -> String {
        self.to_hex()[..SHORT_LEN].to_string()
    }
}

impl std::fmt::Display for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short())
    }
}

impl Serialize for ContentKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_hex().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContentKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).ok_or_else(|| serde::de::Error::custom("invalid content key"))
    }
}

/// Compute the identity key of a file from its path and current mtime.
pub fn identity_key(path: &Path) -> io::Result<ContentKey> {
    let mtime = fs::metadata(path)?.modified()?;
    Ok(key_for(path, mtime))
}

/// Compute the identity key for an explicit (path, mtime) pair.
pub fn key_for(path: &Path, mtime: SystemTime) -> ContentKey {
    let nanos: i128 = match mtime.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_nanos() as i128,
        Err(e) => -(e.duration().as_nanos() as i128),
    };

    let mut hasher = blake3::Hasher::new();
    hasher.update(path.as_os_str().as_encoded_bytes());
    hasher.update(&[0]);
    hasher.update(&nanos.to_le_bytes());
    ContentKey::new(*hasher.finalize().as_bytes())
}
