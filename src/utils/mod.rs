//! Utility functions and helpers.

pub mod deadline;
pub mod http;
pub mod markup;
pub mod mock;

use url::Url;

pub use deadline::Deadline;
pub use http::{Fetcher, HttpFetcher};
pub use markup::{DocumentQuery, HtmlDocument, MarkupElement};

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve a URL string against a base URL string.
pub fn resolve(base_url: &str, href: &str) -> Option<String> {
    Url::parse(base_url)
        .ok()
        .map(|base| resolve_url(&base, href))
}

/// Filesystem-safe stem derived from a company name.
///
/// Lowercases, turns every run of characters outside `[a-z0-9]` into a
/// single `_` and trims underscores at both ends.
pub fn safe_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    if out.is_empty() {
        "document".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Url::parse("https://example.com/path/").unwrap();
        assert_eq!(
            resolve_url(&base, "page.html"),
            "https://example.com/path/page.html"
        );
        assert_eq!(
            resolve_url(&base, "/root.html"),
            "https://example.com/root.html"
        );
        assert_eq!(
            resolve_url(&base, "https://other.com/x"),
            "https://other.com/x"
        );
    }

    #[test]
    fn test_resolve_invalid_base() {
        assert_eq!(resolve("not a url", "/x"), None);
    }

    #[test]
    fn test_safe_filename() {
        assert_eq!(
            safe_filename("Awfis Space Solutions Ltd."),
            "awfis_space_solutions_ltd"
        );
        assert_eq!(safe_filename("  --Zomato--  "), "zomato");
        assert_eq!(safe_filename("A&B (India)"), "a_b_india");
        assert_eq!(safe_filename("???"), "document");
    }
}
