//! Cleanup of single rendered `<script>` / `<link>` tags.
//!
//! Pure string transforms: redundant `type` attributes, `id` attributes and
//! `ver`/`v` cache-busting query parameters are removed.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// `type="text/javascript"` and its historical spellings
static SCRIPT_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\s+type\s*=\s*(?:"(?:text|application)/(?:x-)?javascript"|'(?:text|application)/(?:x-)?javascript')"#,
    )
    .unwrap()
});

/// ` id="…"` (the leading whitespace keeps `data-id` intact)
static ID_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)\s+id\s*=\s*(?:"[^"]*"|'[^']*')"#).unwrap());

/// `src="…"` / `href='…'`, capturing prefix, quoted value and quote
static URL_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(\s(?:src|href)\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Query parameters used only for cache busting.
const VERSION_PARAMS: &[&str] = &["ver", "v"];

/// Sanitize a rendered `<script>` tag.
pub fn sanitize_script_tag(tag: &str) -> String {
    let tag = SCRIPT_TYPE.replace_all(tag, "");
    common(&tag)
}

/// Sanitize a rendered stylesheet `<link>` tag.
pub fn sanitize_style_tag(tag: &str) -> String {
    common(tag)
}

fn common(tag: &str) -> String {
    let tag = ID_ATTR.replace_all(tag, "");
    URL_ATTR
        .replace_all(&tag, |caps: &Captures<'_>| {
            let (value, quote) = match caps.get(2) {
                Some(v) => (v.as_str(), '"'),
                None => (caps.get(3).map_or("", |v| v.as_str()), '\''),
            };
            format!("{}{quote}{}{quote}", &caps[1], strip_version_query(value))
        })
        .into_owned()
}

/// Remove `ver` / `v` query parameters from a URL, keeping the rest.
///
/// Both `&` and the HTML-escaped `&amp;` are recognized as separators; the
/// separator found in the input is used for the output.
pub fn strip_version_query(url: &str) -> Cow<'_, str> {
    let Some((base, rest)) = url.split_once('?') else {
        return Cow::Borrowed(url);
    };
    let (query, fragment) = match rest.split_once('#') {
        Some((q, f)) => (q, Some(f)),
        None => (rest, None),
    };

    let sep = if query.contains("&amp;") { "&amp;" } else { "&" };
    let params: Vec<&str> = query.split(sep).collect();
    let kept: Vec<&str> = params
        .iter()
        .copied()
        .filter(|param| {
            let name = param.split('=').next().unwrap_or(param);
            !VERSION_PARAMS.contains(&name)
        })
        .collect();

    if kept.len() == params.len() {
        return Cow::Borrowed(url);
    }

    let mut out = base.to_string();
    if !kept.is_empty() {
        out.push('?');
        out.push_str(&kept.join(sep));
    }
    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_type_removed() {
        assert_eq!(
            sanitize_script_tag(r#"<script type="text/javascript" src="/a.js"></script>"#),
            r#"<script src="/a.js"></script>"#
        );
        assert_eq!(
            sanitize_script_tag("<script type='text/javascript' src='/a.js'></script>"),
            "<script src='/a.js'></script>"
        );
        // Modules keep their type
        let module = r#"<script type="module" src="/a.js"></script>"#;
        assert_eq!(sanitize_script_tag(module), module);
    }

    #[test]
    fn test_id_removed() {
        assert_eq!(
            sanitize_script_tag(r#"<script id="jquery-js" src="/a.js"></script>"#),
            r#"<script src="/a.js"></script>"#
        );
        assert_eq!(
            sanitize_style_tag(
                r#"<link rel='stylesheet' id='theme-css' href='/s.css' data-id="keep" />"#
            ),
            r#"<link rel='stylesheet' href='/s.css' data-id="keep" />"#
        );
    }

    #[test]
    fn test_version_query_removed_from_urls() {
        assert_eq!(
            sanitize_style_tag(r#"<link rel="stylesheet" href="/s.css?ver=6.4.2" media="all">"#),
            r#"<link rel="stylesheet" href="/s.css" media="all">"#
        );
        assert_eq!(
            sanitize_script_tag(r#"<script src="/a.js?v=3&amp;lang=en"></script>"#),
            r#"<script src="/a.js?lang=en"></script>"#
        );
    }

    #[test]
    fn test_strip_version_query() {
        assert_eq!(strip_version_query("/a.js"), "/a.js");
        assert_eq!(strip_version_query("/a.js?ver=1"), "/a.js");
        assert_eq!(strip_version_query("/a.js?x=1&ver=2&y=3"), "/a.js?x=1&y=3");
        assert_eq!(strip_version_query("/a.js?x=1&amp;v=2"), "/a.js?x=1");
        assert_eq!(strip_version_query("/a.js?ver=1#top"), "/a.js#top");
        assert_eq!(strip_version_query("/a.js?version=1"), "/a.js?version=1");
        assert!(matches!(strip_version_query("/a.js?x=1"), Cow::Borrowed(_)));
    }
}
