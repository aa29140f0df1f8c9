//! Cache error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::resolve::Ineligible;

/// Errors on the caching path.
///
/// None of these ever reach the page: public entry points log them and
/// fall back to the original URL.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("not eligible: {0}")]
    Ineligible(#[from] Ineligible),

    #[error("cannot read source `{}`", .path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write `{}`", .path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cache map `{}` is corrupt", .path.display())]
    MapCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot serialize cache map")]
    Serialize(#[from] serde_json::Error),
}

impl CacheError {
    /// Check if this is a routing decision rather than a failure.
    pub const fn is_ineligible(&self) -> bool {
        matches!(self, Self::Ineligible(_))
    }
}
