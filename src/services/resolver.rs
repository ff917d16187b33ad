//! Document link resolution.
//!
//! Filing pages rarely link the document directly. The link may sit in an
//! anchor, an embedded viewer frame or only inside inline script, and is often
//! wrapped in a viewer URL carrying the real target as a query parameter.

use url::Url;

use crate::models::{ResolvedLink, ResolverConfig};
use crate::utils::{DocumentQuery, HtmlDocument, resolve};

/// Embedded viewer elements and the attribute holding their target.
const FRAME_TARGETS: [(&str, &str); 4] = [
    ("iframe", "src"),
    ("embed", "src"),
    ("frame", "src"),
    ("object", "data"),
];

/// Finds and unwraps the document link on a filing page.
#[derive(Debug, Clone)]
pub struct PdfLinkResolver {
    document_marker: String,
    wrapper_marker: String,
    wrapper_path: String,
    wrapper_param: String,
}

impl PdfLinkResolver {
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            document_marker: config.document_marker.to_lowercase(),
            wrapper_marker: config.wrapper_marker.to_lowercase(),
            wrapper_path: config.wrapper_path.clone(),
            wrapper_param: config.wrapper_param.clone(),
        }
    }

    /// Resolve the document link in raw page markup.
    pub fn resolve(&self, markup: &str, page_url: &str) -> Option<ResolvedLink> {
        self.resolve_document(&HtmlDocument::parse(markup), page_url)
    }

    pub fn resolve_document(&self, doc: &dyn DocumentQuery, page_url: &str) -> Option<ResolvedLink> {
        let raw = self.find_link(doc)?;
        let extracted = resolve(page_url, &raw).unwrap_or(raw);
        let direct = self.unwrap_link(&extracted);
        Some(ResolvedLink { extracted, direct })
    }

    /// First candidate link in priority order: anchors, frames, scripts.
    pub fn find_link(&self, doc: &dyn DocumentQuery) -> Option<String> {
        let anchor = doc
            .find_by_attr("a", "href")
            .into_iter()
            .filter_map(|el| el.attr("href").map(|h| h.trim().to_string()))
            .find(|href| self.is_document_link(href));
        if anchor.is_some() {
            return anchor;
        }

        for (tag, attr) in FRAME_TARGETS {
            let frame = doc
                .find_by_attr(tag, attr)
                .into_iter()
                .filter_map(|el| el.attr(attr).map(|s| s.trim().to_string()))
                .find(|src| self.is_document_link(src));
            if frame.is_some() {
                return frame;
            }
        }

        doc.find_by_tag("script")
            .into_iter()
            .find_map(|script| self.scan_script(&script.text))
    }

    /// Replace a viewer wrapper URL with the target it carries.
    pub fn unwrap_link(&self, link: &str) -> String {
        let param_marker = format!("{}=", self.wrapper_param);
        if !link.contains(&self.wrapper_path) || !link.contains(&param_marker) {
            return link.to_string();
        }

        let Ok(parsed) = Url::parse(link) else {
            return link.to_string();
        };
        let Some(target) = parsed
            .query_pairs()
            .find(|(k, _)| k == self.wrapper_param.as_str())
            .map(|(_, v)| v.into_owned())
        else {
            return link.to_string();
        };
        if target.is_empty() {
            return link.to_string();
        }

        // The site double-encodes the target; query decoding removes one layer.
        let decoded = urlencoding::decode(&target)
            .map(|cow| cow.into_owned())
            .unwrap_or(target);
        resolve(link, &decoded).unwrap_or(decoded)
    }

    fn is_document_link(&self, target: &str) -> bool {
        let lower = target.to_lowercase();
        lower.contains(&self.document_marker) || lower.contains(&self.wrapper_marker)
    }

    /// Look for a wrapper link first, then a direct one, in one script body.
    fn scan_script(&self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }
        let lower = text.to_lowercase();
        for marker in [&self.wrapper_marker, &self.document_marker] {
            if !lower.contains(marker.as_str()) {
                continue;
            }
            let hit = script_tokens(text).find(|token| token.to_lowercase().contains(marker.as_str()));
            if let Some(token) = hit {
                return Some(token.to_string());
            }
        }
        None
    }
}

/// Split script text on whitespace, quotes and brackets.
fn script_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| c.is_whitespace() || "\"'()[]{}".contains(c))
        .filter(|token| !token.is_empty())
}
