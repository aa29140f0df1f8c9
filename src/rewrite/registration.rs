//! Registration-time rewriting of queued scripts and stylesheets.

use crate::asset::AssetKind;
use crate::cache::CacheStore;
use crate::context::RequestContext;
use crate::debug;
use crate::host::{ResourceKind, ResourceRegistry};

use super::attr::try_rewrite;

/// Point every cacheable resource of `kind` at its cached copy.
///
/// Returns how many sources were replaced.
pub fn rewrite_registered<R>(
    registry: &mut R,
    store: &CacheStore,
    ctx: &mut RequestContext,
    kind: ResourceKind,
) -> usize
where
    R: ResourceRegistry + ?Sized,
{
    let fallback = match kind {
        ResourceKind::Script => AssetKind::Script,
        ResourceKind::Style => AssetKind::Stylesheet,
    };

    let mut replaced = 0;
    for resource in registry.enumerate(kind) {
        if resource.src.is_empty() {
            continue;
        }
        if let Some(url) = try_rewrite(store, ctx, &resource.src, Some(&fallback)) {
            debug!("rewrite"; "{} `{}` -> {}", fallback, resource.handle, url);
            registry.set_source(kind, &resource.handle, url);
            replaced += 1;
        }
    }
    replaced
}

/// Rewrite all registered scripts, then all registered stylesheets.
pub fn process_assets<R>(registry: &mut R, store: &CacheStore, ctx: &mut RequestContext) -> usize
where
    R: ResourceRegistry + ?Sized,
{
    rewrite_registered(registry, store, ctx, ResourceKind::Script)
        + rewrite_registered(registry, store, ctx, ResourceKind::Style)
}
