//! Utility modules shared by the cache and the rewriters.

pub mod mime;
pub mod path;
