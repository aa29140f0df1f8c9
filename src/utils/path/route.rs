//! URL string helpers.
//!
//! Pure functions, no parsing into `url::Url`.

/// Check if a link is external (has a URL scheme like http:, mailto:, etc.)
///
/// A valid scheme must:
/// - Have at least 1 character before the colon
/// - Only contain ASCII alphanumeric or `+`, `-`, `.`
#[inline]
pub fn is_external_link(link: &str) -> bool {
    link.find(':').is_some_and(|pos| {
        pos > 0
            && link[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Drop the query string and fragment from a URL.
#[inline]
pub fn strip_query_fragment(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Lowercase file extension of a URL's last path segment.
///
/// Returns `None` for directory-like URLs and segments without a dot.
pub fn url_extension(url: &str) -> Option<String> {
    let path = strip_query_fragment(url);
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_external_link() {
        assert!(is_external_link("https://example.com"));
        assert!(is_external_link("data:image/png;base64,AAAA"));
        assert!(is_external_link("mailto:user@example.com"));
        assert!(!is_external_link("/about"));
        assert!(!is_external_link("//cdn.example.com/a.js"));
        assert!(!is_external_link("./file.txt"));
    }

    #[test]
    fn test_strip_query_fragment() {
        assert_eq!(strip_query_fragment("/a.css?ver=1.2#x"), "/a.css");
        assert_eq!(strip_query_fragment("/a.css#x"), "/a.css");
        assert_eq!(strip_query_fragment("/a.css"), "/a.css");
    }

    #[test]
    fn test_url_extension() {
        assert_eq!(url_extension("/style.CSS?ver=6.4"), Some("css".into()));
        assert_eq!(url_extension("https://h.test/img/a.b.png"), Some("png".into()));
        assert_eq!(url_extension("/feed/"), None);
        assert_eq!(url_extension("/script"), None);
        assert_eq!(url_extension("/.htaccess"), None);
        assert_eq!(url_extension("/v1.2/app"), None);
    }
}
