//! Single-URL rewriters for attribute values.

use crate::asset::{AssetKind, classify};
use crate::cache::CacheStore;
use crate::context::RequestContext;
use crate::host::AttachmentResolver;

/// Cached URL for `url`, or `url` itself.
///
/// `fallback` is the kind implied by the surrounding markup; the URL's own
/// extension takes precedence over it.
pub fn rewrite_url(
    store: &CacheStore,
    ctx: &mut RequestContext,
    url: &str,
    fallback: Option<&AssetKind>,
) -> String {
    try_rewrite(store, ctx, url, fallback).unwrap_or_else(|| url.to_string())
}

/// Cached URL for `url`, or `None` when nothing was rewritten.
pub(crate) fn try_rewrite(
    store: &CacheStore,
    ctx: &mut RequestContext,
    url: &str,
    fallback: Option<&AssetKind>,
) -> Option<String> {
    let url = url.trim();
    if !store.should_process(url) {
        return None;
    }
    let kind = classify(url, fallback)?;
    store.cached_url(url, &kind, ctx)
}

/// Stylesheet URL filter.
pub fn style_src(store: &CacheStore, ctx: &mut RequestContext, url: &str) -> String {
    rewrite_url(store, ctx, url, Some(&AssetKind::Stylesheet))
}

/// Script URL filter.
pub fn script_src(store: &CacheStore, ctx: &mut RequestContext, url: &str) -> String {
    rewrite_url(store, ctx, url, Some(&AssetKind::Script))
}

/// URL of a media-library attachment, rewritten to its cached copy.
///
/// The URL suffix decides the kind; the attachment's MIME type is only a
/// hint for extensionless URLs, whose target must still be a static file.
/// Returns `None` only when the host knows no URL for `id`.
pub fn attachment_url<R>(
    store: &CacheStore,
    ctx: &mut RequestContext,
    resolver: &R,
    id: u64,
) -> Option<String>
where
    R: AttachmentResolver + ?Sized,
{
    let url = resolver.url(id)?;
    let hint = resolver
        .mime_type(id)
        .and_then(|mime| AssetKind::from_mime(&mime));

    Some(rewrite_url(store, ctx, &url, hint.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::tests::Fixture;

    struct Library;

    impl AttachmentResolver for Library {
        fn url(&self, id: u64) -> Option<String> {
            match id {
                1 => Some("/uploads/photo.jpg".into()),
                2 => Some("/uploads/photo".into()),
                3 => Some("/uploads/report.php".into()),
                _ => None,
            }
        }

        fn mime_type(&self, id: u64) -> Option<String> {
            match id {
                1 | 2 | 3 => Some("image/jpeg".into()),
                _ => None,
            }
        }
    }

    #[test]
    fn test_style_and_script_src() {
        let fx = Fixture::new();
        fx.write("style.css", "body {}");
        fx.write("app.js", "void 0;");
        let mut ctx = RequestContext::new();

        let css = style_src(&fx.store, &mut ctx, "/style.css?ver=6.4");
        let js = script_src(&fx.store, &mut ctx, "https://example.test/app.js");
        assert!(css.starts_with("https://example.test/cache/css/"));
        assert!(js.starts_with("https://example.test/cache/js/"));
    }

    #[test]
    fn test_ineligible_urls_pass_through() {
        let fx = Fixture::new();
        let mut ctx = RequestContext::new();

        for url in [
            "",
            "https://other.test/style.css",
            "/missing.css",
            "data:text/css,body{}",
        ] {
            assert_eq!(style_src(&fx.store, &mut ctx, url), url);
        }
    }

    #[test]
    fn test_server_side_sources_are_never_cached() {
        let fx = Fixture::new();
        fx.write("config.php", "<?php secret();");
        let mut ctx = RequestContext::new();

        assert_eq!(
            script_src(&fx.store, &mut ctx, "/config.php"),
            "/config.php"
        );
        assert_eq!(fx.store.stats().writes, 0);
    }

    #[test]
    fn test_attachment_url() {
        let fx = Fixture::new();
        fx.write("uploads/photo.jpg", "jpg");
        fx.write("uploads/photo", "jpg");
        fx.write("uploads/report.php", "<?php");
        let mut ctx = RequestContext::new();

        let jpg = attachment_url(&fx.store, &mut ctx, &Library, 1).unwrap();
        assert!(jpg.contains("/cache/img/") && jpg.ends_with(".jpg"));

        // The file itself must name a static format, whatever the MIME type
        assert_eq!(
            attachment_url(&fx.store, &mut ctx, &Library, 2).unwrap(),
            "/uploads/photo"
        );

        // The suffix vetoes caching even if the MIME type says image
        assert_eq!(
            attachment_url(&fx.store, &mut ctx, &Library, 3).unwrap(),
            "/uploads/report.php"
        );
        assert_eq!(attachment_url(&fx.store, &mut ctx, &Library, 9), None);
    }
}
