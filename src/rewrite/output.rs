//! Whole-document rewriting of rendered HTML.
//!
//! The document is streamed through `lol_html`; only attributes whose value
//! actually changes are touched, everything else is emitted byte-for-byte.

use std::cell::RefCell;

use lol_html::errors::RewritingError;
use lol_html::html_content::Element;
use lol_html::{RewriteStrSettings, element, rewrite_str};

use crate::asset::AssetKind;
use crate::cache::CacheStore;
use crate::context::RequestContext;
use crate::{debug, log};

use super::attr::try_rewrite;
use super::srcset::rewrite_srcset_attr;

/// Shared state of one rewriting pass.
struct Pass<'a> {
    store: &'a CacheStore,
    ctx: &'a mut RequestContext,
    rewritten: usize,
}

impl Pass<'_> {
    /// Rewrite a URL-valued attribute in place.
    fn url_attr(
        &mut self,
        el: &mut Element<'_, '_>,
        name: &str,
        fallback: Option<&AssetKind>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let Some(value) = el.get_attribute(name) else {
            return Ok(());
        };
        if let Some(url) = try_rewrite(self.store, self.ctx, &value, fallback) {
            el.set_attribute(name, &url)?;
            self.rewritten += 1;
        }
        Ok(())
    }

    /// Rewrite a `srcset` attribute in place.
    fn srcset_attr(
        &mut self,
        el: &mut Element<'_, '_>,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let Some(value) = el.get_attribute("srcset") else {
            return Ok(());
        };
        let rewritten = rewrite_srcset_attr(self.store, self.ctx, &value);
        if rewritten != value {
            el.set_attribute("srcset", &rewritten)?;
            self.rewritten += 1;
        }
        Ok(())
    }
}

/// Kind implied by an element for its `src`/`href` URL.
fn element_kind(tag: &str) -> Option<AssetKind> {
    match tag.to_ascii_lowercase().as_str() {
        "script" => Some(AssetKind::Script),
        "link" => Some(AssetKind::Stylesheet),
        "img" | "source" | "picture" => Some(AssetKind::Image),
        _ => None,
    }
}

/// Rewrite asset references in a fully rendered page.
///
/// Handles `script[src]`, `link[href]`, `img[src]`, and the `srcset` of
/// `img` and `source`. On any parse failure the input is returned as-is.
pub fn process_output(store: &CacheStore, ctx: &mut RequestContext, html: &str) -> String {
    let pass = RefCell::new(Pass {
        store,
        ctx,
        rewritten: 0,
    });

    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("script[src]", |el| {
                    pass.borrow_mut()
                        .url_attr(el, "src", Some(&AssetKind::Script))
                }),
                element!("link[href]", |el| {
                    pass.borrow_mut()
                        .url_attr(el, "href", Some(&AssetKind::Stylesheet))
                }),
                element!("img[src]", |el| {
                    pass.borrow_mut().url_attr(el, "src", Some(&AssetKind::Image))
                }),
                element!("img[srcset], source[srcset]", |el| {
                    pass.borrow_mut().srcset_attr(el)
                }),
            ],
            ..RewriteStrSettings::new()
        },
    );

    finish(result, html, pass.into_inner().rewritten)
}

/// Rewrite asset references in a content fragment (post body, widget text).
///
/// Every element's `src` is considered, with the kind taken from the URL
/// suffix or, failing that, from the element. `srcset` is handled as in
/// [`process_output`].
pub fn process_content(store: &CacheStore, ctx: &mut RequestContext, html: &str) -> String {
    let pass = RefCell::new(Pass {
        store,
        ctx,
        rewritten: 0,
    });

    let result = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("[src]", |el| {
                    let kind = element_kind(&el.tag_name());
                    pass.borrow_mut().url_attr(el, "src", kind.as_ref())
                }),
                element!("img[srcset], source[srcset]", |el| {
                    pass.borrow_mut().srcset_attr(el)
                }),
            ],
            ..RewriteStrSettings::new()
        },
    );

    finish(result, html, pass.into_inner().rewritten)
}

fn finish(result: Result<String, RewritingError>, html: &str, count: usize) -> String {
    match result {
        Ok(output) => {
            debug!("rewrite"; "{} references rewritten", count);
            output
        }
        Err(e) => {
            log!("rewrite"; "html rewrite failed, serving original: {}", e);
            html.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::tests::Fixture;

    #[test]
    fn test_element_kind() {
        assert_eq!(element_kind("SCRIPT"), Some(AssetKind::Script));
        assert_eq!(element_kind("link"), Some(AssetKind::Stylesheet));
        assert_eq!(element_kind("img"), Some(AssetKind::Image));
        assert_eq!(element_kind("iframe"), None);
    }

    #[test]
    fn test_markup_without_assets_is_untouched() {
        let fx = Fixture::new();
        let mut ctx = RequestContext::new();
        let html = "<!DOCTYPE html>\n<html><head><title>x</title></head>\n<body><p class='a'>hi &amp; bye</p></body></html>";
        assert_eq!(process_output(&fx.store, &mut ctx, html), html);
    }

    #[test]
    fn test_rewrites_script_link_and_img() {
        let fx = Fixture::new();
        fx.write("app.js", "void 0;");
        fx.write("style.css", "body {}");
        fx.write("a.png", "png");
        let mut ctx = RequestContext::new();

        let html = concat!(
            r#"<link rel="stylesheet" href="/style.css?ver=1">"#,
            r#"<script src="/app.js"></script>"#,
            r#"<img src="/a.png" alt="a">"#,
        );
        let out = process_output(&fx.store, &mut ctx, html);

        assert!(out.contains(r#"href="https://example.test/cache/css/"#));
        assert!(out.contains(r#"src="https://example.test/cache/js/"#));
        assert!(out.contains(r#"src="https://example.test/cache/img/"#));
        assert!(out.contains(r#"alt="a""#));
        assert!(!out.contains("/style.css"));
        assert_eq!(fx.store.stats().writes, 3);
    }

    #[test]
    fn test_local_and_foreign_images() {
        let fx = Fixture::new();
        fx.write("a.png", "png");
        let mut ctx = RequestContext::new();

        let html = r#"<img src="/a.png"><img src="https://other.test/b.png">"#;
        let out = process_output(&fx.store, &mut ctx, html);

        assert!(!out.contains(r#"src="/a.png""#));
        assert!(out.contains(r#"<img src="https://other.test/b.png">"#));
    }

    #[test]
    fn test_srcset_in_picture() {
        let fx = Fixture::new();
        fx.write("a.webp", "webp");
        fx.write("a.png", "png");
        let mut ctx = RequestContext::new();

        let html = r#"<picture><source srcset="/a.webp 1x"><img srcset="/a.png 1x, https://cdn.test/a.png 2x"></picture>"#;
        let out = process_output(&fx.store, &mut ctx, html);

        assert!(!out.contains(r#""/a.webp 1x""#));
        assert!(out.contains(".webp 1x"));
        assert!(out.contains("https://cdn.test/a.png 2x"));
    }

    #[test]
    fn test_link_to_page_is_not_cached() {
        let fx = Fixture::new();
        fx.write("about/index.html", "<p>about</p>");
        let mut ctx = RequestContext::new();

        let html = r#"<link rel="canonical" href="/about/"><link rel="alternate" href="/about/index.html">"#;
        assert_eq!(process_output(&fx.store, &mut ctx, html), html);
        assert_eq!(fx.store.stats().writes, 0);
    }

    #[test]
    fn test_process_content_rewrites_any_src() {
        let fx = Fixture::new();
        fx.write("media/clip.mp4", "mp4");
        fx.write("a.png", "png");
        let mut ctx = RequestContext::new();

        let html = r#"<p><video src="/media/clip.mp4"></video><img src="/a.png"><iframe src="/embed"></iframe></p>"#;
        let out = process_content(&fx.store, &mut ctx, html);

        assert!(out.contains(r#"src="https://example.test/cache/mp4/"#));
        assert!(out.contains(r#"src="https://example.test/cache/img/"#));
        assert!(out.contains(r#"<iframe src="/embed">"#));
    }
}
