//! Hook surfaces of the host framework.
//!
//! The cache never talks to a web framework directly. Hosts implement these
//! traits over their own resource queues, response buffers and media
//! libraries; in-memory implementations are provided for simple hosts and
//! tests.

/// Type of a registered page resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Script,
    Style,
}

/// A resource a page intends to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredResource {
    /// Host-side identifier of the resource
    pub handle: String,
    /// Declared source URL (may be empty for inline-only resources)
    pub src: String,
}

impl RegisteredResource {
    pub fn new(handle: impl Into<String>, src: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            src: src.into(),
        }
    }
}

/// Registration-time hook surface.
pub trait ResourceRegistry {
    /// All resources of `kind` currently registered.
    fn enumerate(&self, kind: ResourceKind) -> Vec<RegisteredResource>;

    /// Replace the source URL of a registered resource.
    fn set_source(&mut self, kind: ResourceKind, handle: &str, url: String);
}

/// Media-library lookups for attachment rewriting.
pub trait AttachmentResolver {
    fn url(&self, id: u64) -> Option<String>;
    fn mime_type(&self, id: u64) -> Option<String>;
}

/// A response whose fully rendered body can be post-processed once.
pub trait RenderedOutput {
    fn intercept<F>(&mut self, transform: F)
    where
        F: FnOnce(String) -> String;
}

// ============================================================================
// In-memory implementations
// ============================================================================

/// Ordered script and style queues.
#[derive(Debug, Clone, Default)]
pub struct ResourceQueue {
    scripts: Vec<RegisteredResource>,
    styles: Vec<RegisteredResource>,
}

impl ResourceQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource, replacing one with the same handle.
    pub fn register(&mut self, kind: ResourceKind, handle: &str, src: &str) {
        let list = self.list_mut(kind);
        match list.iter_mut().find(|r| r.handle == handle) {
            Some(existing) => existing.src = src.to_string(),
            None => list.push(RegisteredResource::new(handle, src)),
        }
    }

    /// Source URL of a registered resource.
    pub fn source(&self, kind: ResourceKind, handle: &str) -> Option<&str> {
        self.list(kind)
            .iter()
            .find(|r| r.handle == handle)
            .map(|r| r.src.as_str())
    }

    fn list(&self, kind: ResourceKind) -> &Vec<RegisteredResource> {
        match kind {
            ResourceKind::Script => &self.scripts,
            ResourceKind::Style => &self.styles,
        }
    }

    fn list_mut(&mut self, kind: ResourceKind) -> &mut Vec<RegisteredResource> {
        match kind {
            ResourceKind::Script => &mut self.scripts,
            ResourceKind::Style => &mut self.styles,
        }
    }
}

impl ResourceRegistry for ResourceQueue {
    fn enumerate(&self, kind: ResourceKind) -> Vec<RegisteredResource> {
        self.list(kind).clone()
    }

    fn set_source(&mut self, kind: ResourceKind, handle: &str, url: String) {
        if let Some(resource) = self.list_mut(kind).iter_mut().find(|r| r.handle == handle) {
            resource.src = url;
        }
    }
}

/// A response body held in memory until it is sent.
#[derive(Debug, Clone, Default)]
pub struct BufferedResponse {
    body: String,
}

impl BufferedResponse {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }
}

impl RenderedOutput for BufferedResponse {
    fn intercept<F>(&mut self, transform: F)
    where
        F: FnOnce(String) -> String,
    {
        let body = std::mem::take(&mut self.body);
        self.body = transform(body);
    }
}
