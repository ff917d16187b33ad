//! Listing page parser.
//!
//! Extracts filing entries from a full listing page or a paging fragment;
//! both use the same anchor rule.

use url::Url;

use crate::error::Result;
use crate::models::{ListingConfig, ListingEntry};
use crate::utils::{DocumentQuery, HtmlDocument, resolve_url};

/// Pulls `(title, url)` entries out of listing markup.
#[derive(Debug, Clone)]
pub struct PageParser {
    base_url: Url,
    path_pattern: String,
    suffix: String,
}

impl PageParser {
    pub fn new(config: &ListingConfig) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(&config.base_url)?,
            path_pattern: config.entry_path_pattern.clone(),
            suffix: config.entry_suffix.clone(),
        })
    }

    /// Parse raw markup. Never fails; an empty result means no entries.
    pub fn parse(&self, markup: &str) -> Vec<ListingEntry> {
        self.parse_document(&HtmlDocument::parse(markup))
    }

    pub fn parse_document(&self, doc: &dyn DocumentQuery) -> Vec<ListingEntry> {
        doc.find_by_attr("a", "href")
            .into_iter()
            .filter_map(|anchor| {
                let href = anchor.attr("href")?.trim();
                if !self.is_filing_link(href) {
                    return None;
                }
                let title = anchor.clean_text();
                if title.is_empty() {
                    return None;
                }
                Some(ListingEntry {
                    title,
                    url: resolve_url(&self.base_url, href),
                })
            })
            .collect()
    }

    fn is_filing_link(&self, href: &str) -> bool {
        href.contains(&self.path_pattern) && href.ends_with(&self.suffix)
    }
}
