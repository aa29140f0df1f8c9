//! Asset classification: which bucket a cached file lands in.

mod kind;

pub use kind::{AssetKind, classify, source_kind};
