//! Cloak - content-addressed asset cache with transparent URL rewriting.
//!
//! Local scripts, stylesheets and images referenced by a page are copied into
//! a cache directory under a name derived from their path and modification
//! time, and every reference to them is rewritten to the cached location.
//!
//! # Module Structure
//!
//! ```text
//! src/
//! ├── asset/      # AssetKind: type buckets and extension policy
//! ├── cache/      # CacheStore, CacheMap persistence, errors
//! ├── config/     # cloak.toml sections and validation
//! ├── context     # RequestContext + RuntimeMemo
//! ├── host        # traits for the host framework's hook surfaces
//! ├── identity    # ContentKey derivation (blake3 of path + mtime)
//! ├── logger      # log!/debug! macros
//! ├── protect     # cache directory + policy file bootstrap
//! ├── resolve/    # URL -> canonical local path
//! ├── rewrite/    # registration, attribute, output, srcset, tag rewriters
//! ├── shield      # Cloak facade
//! └── utils/      # mime + path helpers
//! ```
//!
//! # Example
//!
//! ```ignore
//! let cloak = Cloak::from_config_file("cloak.toml")?;
//!
//! // once per request
//! let mut ctx = cloak.begin_request();
//! cloak.process_assets(&mut registry, &mut ctx);
//! let body = cloak.process_output(&rendered, &mut ctx);
//! ```

pub mod logger;

pub mod asset;
pub mod cache;
pub mod config;
pub mod context;
pub mod host;
pub mod identity;
pub mod protect;
pub mod resolve;
pub mod rewrite;
mod shield;
pub mod utils;

pub use asset::AssetKind;
pub use cache::{CacheError, CacheStore, CachedAsset};
pub use config::{ConfigError, SiteConfig};
pub use context::{RequestContext, RuntimeMemo};
pub use resolve::{Ineligible, PathResolver};
pub use shield::Cloak;
