//! Query and title normalization.

use std::collections::HashSet;

use crate::models::{MatchingConfig, Query};

/// Canonicalizes company names and listing titles into comparable text.
#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    stopwords: HashSet<String>,
}

impl QueryNormalizer {
    pub fn new(config: &MatchingConfig) -> Self {
        Self::with_stopwords(config.stopwords.iter().map(String::as_str))
    }

    pub fn with_stopwords<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            stopwords: words.into_iter().map(str::to_lowercase).collect(),
        }
    }

    /// Lowercase, blank out punctuation, drop stopwords, collapse spaces.
    ///
    /// Pure and idempotent; used on both sides of every comparison.
    pub fn normalize(&self, text: &str) -> String {
        let lowered: String = text
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
            .collect();

        lowered
            .split_whitespace()
            .filter(|token| !self.stopwords.contains(*token))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn query(&self, raw: &str) -> Query {
        Query {
            raw: raw.to_string(),
            normalized: self.normalize(raw),
        }
    }
}
