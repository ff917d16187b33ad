//! Candidate scoring and document-type classification.

use std::collections::HashSet;

use similar::{DiffTag, TextDiff};

use crate::models::{Candidate, DocType, ListingEntry, MatchingConfig, Query};
use crate::services::QueryNormalizer;

/// Scores listing entries against a normalized query.
#[derive(Debug, Clone)]
pub struct CandidateScorer {
    normalizer: QueryNormalizer,
    substring_boost: f64,
    min_substring_len: usize,
    token_subset_boost: f64,
}

impl CandidateScorer {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            normalizer: QueryNormalizer::new(config),
            substring_boost: config.substring_boost,
            min_substring_len: config.min_substring_len,
            token_subset_boost: config.token_subset_boost,
        }
    }

    /// Similarity of two normalized strings in `[0, 1]`.
    ///
    /// The base is the matching-character ratio `2 * M / (|q| + |t|)`, M
    /// being the characters the two strings share in order. A query of at least
    /// `min_substring_len` characters found verbatim in the title lifts the
    /// score to `substring_boost`; a query whose tokens all occur in the
    /// title lifts it to `token_subset_boost`.
    pub fn score(&self, query_norm: &str, title_norm: &str) -> f64 {
        if query_norm.is_empty() || title_norm.is_empty() {
            return 0.0;
        }

        let mut score = match_ratio(query_norm, title_norm);

        if query_norm.len() >= self.min_substring_len && title_norm.contains(query_norm) {
            score = score.max(self.substring_boost);
        }

        let title_tokens: HashSet<&str> = title_norm.split_whitespace().collect();
        if query_norm
            .split_whitespace()
            .all(|token| title_tokens.contains(token))
        {
            score = score.max(self.token_subset_boost);
        }

        score.clamp(0.0, 1.0)
    }

    /// Score and classify one listing entry.
    pub fn evaluate(&self, query: &Query, entry: ListingEntry) -> Candidate {
        self.evaluate_exact(query, entry).0
    }

    /// Like [`evaluate`](Self::evaluate), also returning the unrounded score.
    pub fn evaluate_exact(&self, query: &Query, entry: ListingEntry) -> (Candidate, f64) {
        let title_normalized = self.normalizer.normalize(&entry.title);
        let score = self.score(&query.normalized, &title_normalized);
        let candidate = Candidate {
            doc_type: DocType::classify(&entry.title),
            title_raw: entry.title,
            title_normalized,
            url: entry.url,
            match_score: round4(score),
        };
        (candidate, score)
    }
}

fn match_ratio(a: &str, b: &str) -> f64 {
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 1.0;
    }
    let diff = TextDiff::from_chars(a, b);
    let matched: usize = diff
        .ops()
        .iter()
        .map(|op| match op.as_tag_tuple() {
            (DiffTag::Equal, old, _) => old.len(),
            _ => 0,
        })
        .sum();
    2.0 * matched as f64 / total as f64
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
