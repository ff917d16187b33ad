// src/utils/markup.rs

//! Narrow document query interface over parsed markup.
//!
//! Parsers and resolvers only need to find elements by tag, read attributes
//! and read text. [`DocumentQuery`] exposes exactly that, so fixtures can
//! stand in for real pages and the HTML backend stays swappable.

use scraper::{Html, Selector};

/// A detached element: tag name, attributes and text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupElement {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub text: String,
}

impl MarkupElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            text: String::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Attribute value by case-insensitive name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Text content with whitespace runs collapsed.
    pub fn clean_text(&self) -> String {
        self.text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Element lookup over one document.
pub trait DocumentQuery {
    /// All elements with the given tag name, in document order.
    fn find_by_tag(&self, tag: &str) -> Vec<MarkupElement>;

    /// Elements with the given tag that carry `attr`.
    fn find_by_attr(&self, tag: &str, attr: &str) -> Vec<MarkupElement> {
        self.find_by_tag(tag)
            .into_iter()
            .filter(|el| el.attr(attr).is_some())
            .collect()
    }
}

/// [`DocumentQuery`] backed by `scraper`.
///
/// Parsing is lenient: malformed markup yields whatever elements the HTML5
/// tree builder recovers, never an error.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }
}

impl DocumentQuery for HtmlDocument {
    fn find_by_tag(&self, tag: &str) -> Vec<MarkupElement> {
        let selector = match Selector::parse(tag) {
            Ok(selector) => selector,
            Err(e) => {
                log::debug!("Unusable tag selector '{}': {:?}", tag, e);
                return Vec::new();
            }
        };

        self.html
            .select(&selector)
            .map(|el| MarkupElement {
                tag: el.value().name().to_string(),
                attrs: el
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                text: el.text().collect::<Vec<_>>().join(" "),
            })
            .collect()
    }

    fn find_by_attr(&self, tag: &str, attr: &str) -> Vec<MarkupElement> {
        // Let the selector engine do the filtering.
        let selector = format!("{tag}[{attr}]");
        self.find_by_tag(&selector)
    }
}
