//! `Cloak`: the component a host builds once and calls from its hooks.

use std::path::Path;

use anyhow::{Context, Result};

use crate::asset::AssetKind;
use crate::cache::CacheStore;
use crate::config::{ConfigError, SiteConfig};
use crate::context::RequestContext;
use crate::host::{AttachmentResolver, RenderedOutput, ResourceRegistry};
use crate::protect::{ProtectionReport, ensure_protection};
use crate::resolve::PathResolver;
use crate::rewrite::{self, SrcsetCandidate};
use crate::{debug, log};

/// Asset cache plus every rewriting entry point.
///
/// Shared by all request workers (`Send + Sync`); per-request state lives in
/// the [`RequestContext`] returned by [`begin_request`](Self::begin_request).
#[derive(Debug)]
pub struct Cloak {
    config: SiteConfig,
    store: CacheStore,
    protection: ProtectionReport,
}

impl Cloak {
    /// Build from a configuration.
    ///
    /// Relative paths are resolved against the working directory. Creates the
    /// cache directory and its policy file, then loads the cache map.
    pub fn new(mut config: SiteConfig) -> Result<Self, ConfigError> {
        if let Ok(cwd) = std::env::current_dir() {
            config.finalize(&cwd);
        }
        config.validate()?;
        crate::logger::set_verbose(config.verbose);

        let site = config.site_url()?;
        let base_url = config.cache_url()?;

        let protection = ensure_protection(
            &config.cache.dir,
            &config.protect,
            &config.cache.map_file,
        );
        if !protection.is_complete() {
            log!("protect"; "cache directory protection incomplete: {:?}", protection);
        }

        let root = config.get_root();
        let resolver =
            PathResolver::new(site, root).map_err(|e| ConfigError::Io(root.to_path_buf(), e))?;
        let store = CacheStore::open(resolver, &config.cache.dir, base_url, &config.cache.map_file);
        debug!(
            "cache";
            "serving {} from {} ({} entries)",
            store.base_url(),
            store.root().display(),
            store.map().len()
        );

        Ok(Self {
            config,
            store,
            protection,
        })
    }

    /// Load `cloak.toml` and build.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = SiteConfig::load(path)
            .with_context(|| format!("Failed to load config `{}`", path.display()))?;
        Self::new(config).context("Failed to initialize asset cache")
    }

    /// Fresh state for one request/response cycle.
    pub fn begin_request(&self) -> RequestContext {
        RequestContext::new()
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Result of the cache directory bootstrap.
    pub fn protection(&self) -> ProtectionReport {
        self.protection
    }

    /// Check if `url` points at this site.
    pub fn should_process(&self, url: &str) -> bool {
        self.store.should_process(url)
    }

    /// Cached URL for `url`, or `None` when it cannot be cached.
    pub fn cached_url(
        &self,
        url: &str,
        kind: &AssetKind,
        ctx: &mut RequestContext,
    ) -> Option<String> {
        self.store.cached_url(url, kind, ctx)
    }

    // ========================================================================
    // registration and attribute hooks
    // ========================================================================

    /// Point registered scripts and stylesheets at their cached copies.
    pub fn process_assets<R>(&self, registry: &mut R, ctx: &mut RequestContext) -> usize
    where
        R: ResourceRegistry + ?Sized,
    {
        rewrite::process_assets(registry, &self.store, ctx)
    }

    pub fn style_src(&self, url: &str, ctx: &mut RequestContext) -> String {
        rewrite::style_src(&self.store, ctx, url)
    }

    pub fn script_src(&self, url: &str, ctx: &mut RequestContext) -> String {
        rewrite::script_src(&self.store, ctx, url)
    }

    pub fn attachment_url<A>(&self, attachments: &A, id: u64, ctx: &mut RequestContext) -> Option<String>
    where
        A: AttachmentResolver + ?Sized,
    {
        rewrite::attachment_url(&self.store, ctx, attachments, id)
    }

    /// Rewrite responsive image candidates in place.
    pub fn image_srcset(&self, candidates: &mut [SrcsetCandidate], ctx: &mut RequestContext) -> usize {
        rewrite::rewrite_srcset(&self.store, ctx, candidates)
    }

    /// Rewrite a raw `srcset` attribute value.
    pub fn srcset_attr(&self, value: &str, ctx: &mut RequestContext) -> String {
        rewrite::rewrite_srcset_attr(&self.store, ctx, value)
    }

    // ========================================================================
    // output hooks
    // ========================================================================

    /// Rewrite a fully rendered page.
    pub fn process_output(&self, html: &str, ctx: &mut RequestContext) -> String {
        rewrite::process_output(&self.store, ctx, html)
    }

    /// Rewrite a content fragment.
    pub fn process_content(&self, html: &str, ctx: &mut RequestContext) -> String {
        rewrite::process_content(&self.store, ctx, html)
    }

    pub fn filter_script_tag(&self, tag: &str) -> String {
        rewrite::sanitize_script_tag(tag)
    }

    pub fn filter_style_tag(&self, tag: &str) -> String {
        rewrite::sanitize_style_tag(tag)
    }

    /// Run [`process_output`](Self::process_output) over the response body
    /// once rendering is complete.
    pub fn install_output_filter<O>(&self, output: &mut O, ctx: &mut RequestContext)
    where
        O: RenderedOutput + ?Sized,
    {
        output.intercept(|body| self.process_output(&body, ctx));
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::host::{BufferedResponse, ResourceKind, ResourceQueue};
    use crate::protect::{POLICY_FILE, PolicyStatus};

    fn site() -> (TempDir, Cloak) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("www");
        fs::create_dir_all(root.join("theme")).unwrap();
        fs::write(root.join("theme/style.css"), "body {}").unwrap();
        fs::write(root.join("theme/app.js"), "void 0;").unwrap();
        fs::write(root.join("logo.png"), "png").unwrap();

        let cloak = Cloak::new(SiteConfig::new("https://example.test", &root)).unwrap();
        (dir, cloak)
    }

    #[test]
    fn test_cloak_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Cloak>();
    }

    #[test]
    fn test_new_bootstraps_cache_dir() {
        let (_dir, cloak) = site();
        let cache = &cloak.config().cache.dir;

        assert!(cache.is_dir());
        assert!(cache.join(POLICY_FILE).is_file());
        assert!(cloak.protection().is_complete());
        assert_eq!(cloak.protection().policy, PolicyStatus::Written);
        assert_eq!(
            cloak.store().base_url(),
            "https://example.test/wp-content/uploads/assets"
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = Cloak::new(SiteConfig::new("not a url", dir.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_from_config_file() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("www")).unwrap();
        let path = dir.path().join("cloak.toml");
        fs::write(
            &path,
            "[site]\nurl = \"https://example.test\"\nroot = \"www\"\n[cache]\ndir = \"c\"\n",
        )
        .unwrap();

        let cloak = Cloak::from_config_file(&path).unwrap();
        assert_eq!(cloak.store().base_url(), "https://example.test/c");
        assert!(Cloak::from_config_file(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_request_flow() {
        let (_dir, cloak) = site();
        let mut ctx = cloak.begin_request();

        let mut queue = ResourceQueue::new();
        queue.register(ResourceKind::Style, "theme", "/theme/style.css?ver=1");
        assert_eq!(cloak.process_assets(&mut queue, &mut ctx), 1);

        let tag = format!(
            r#"<link rel='stylesheet' id='theme-css' href='{}' />"#,
            queue.source(ResourceKind::Style, "theme").unwrap()
        );
        let tag = cloak.filter_style_tag(&tag);
        assert!(!tag.contains("id="));

        let mut response = BufferedResponse::new(format!(
            r#"{tag}<script src="/theme/app.js"></script><img src="/logo.png"><img src="https://other.test/x.png">"#
        ));
        cloak.install_output_filter(&mut response, &mut ctx);

        let body = response.into_body();
        assert!(!body.contains("/theme/"));
        assert!(!body.contains(r#"src="/logo.png""#));
        assert!(body.contains("https://other.test/x.png"));
        assert_eq!(cloak.store().stats().writes, 3);
    }

    #[test]
    fn test_attribute_hooks() {
        let (_dir, cloak) = site();
        let mut ctx = cloak.begin_request();

        assert!(cloak.should_process("/theme/style.css"));
        assert!(!cloak.should_process("https://other.test/style.css"));

        let js = cloak.script_src("/theme/app.js", &mut ctx);
        assert!(js.contains("/js/"));
        assert_eq!(
            cloak.style_src("https://other.test/a.css", &mut ctx),
            "https://other.test/a.css"
        );
        assert_eq!(
            cloak.cached_url("/theme/app.js", &AssetKind::Script, &mut ctx),
            Some(js)
        );

        let srcset = cloak.srcset_attr("/logo.png 2x", &mut ctx);
        assert!(srcset.ends_with(".png 2x") && srcset.contains("/img/"));
    }
}
