//! Path and URL utilities.
//!
//! - [`fs`]: Filesystem helpers (`normalize_path`, `resolve_path`, `write_atomic`)
//! - [`route`]: URL helpers (`is_external_link`, `strip_query_fragment`, `url_extension`)

pub mod fs;
pub mod route;

pub use fs::{file_content_matches, normalize_path, resolve_path, write_atomic};
