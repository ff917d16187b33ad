//! Results of discovery and acquisition.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TerminalFailure;
use crate::models::{Candidate, DocType};

/// Label reported for the paging strategy in use.
pub const PAGINATION_MODE: &str = "ajax_doDirect";

/// Whether discovery found an admissible filing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Ok,
    NotFound,
}

/// Why the crawl stopped requesting pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStop {
    /// The bootstrap page failed or listed nothing
    BootstrapEmpty,
    /// A strong RHP/DRHP match made further pages unnecessary
    EarlyExit,
    /// A page came back without entries
    PageEmpty,
    /// A page request failed; earlier results are kept
    PageFailed,
    /// The page limit was reached
    PagesExhausted,
}

/// Compact view of a candidate for "did you mean" suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopMatch {
    pub title: String,
    pub score: f64,
    pub doc_type: DocType,
    pub url: String,
}

impl From<&Candidate> for TopMatch {
    fn from(c: &Candidate) -> Self {
        Self {
            title: c.title_raw.clone(),
            score: c.match_score,
            doc_type: c.doc_type,
            url: c.url.clone(),
        }
    }
}

/// Immutable result of one discovery run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub status: SearchStatus,
    pub input_company: String,
    pub chosen: Option<Candidate>,
    pub top_matches: Vec<TopMatch>,
    pub pages_scanned: usize,
    pub unique_titles_count: usize,
    pub crawl_stop: CrawlStop,
}

impl SearchOutcome {
    pub fn is_found(&self) -> bool {
        self.status == SearchStatus::Ok
    }

    /// Flat, serializable form of the outcome.
    pub fn report(&self) -> DiscoveryReport {
        let chosen = self.chosen.as_ref();
        DiscoveryReport {
            status: self.status,
            input_company: self.input_company.clone(),
            matched_title: chosen.map(|c| c.title_raw.clone()),
            match_score: chosen.map(|c| c.match_score),
            doc_type: chosen.map(|c| c.doc_type),
            resolved_html_url: chosen.map(|c| c.url.clone()),
            pages_scanned: self.pages_scanned,
            pagination_mode_used: PAGINATION_MODE.to_string(),
            unique_titles_count: self.unique_titles_count,
            crawl_stop: self.crawl_stop,
            top_matches: self.top_matches.clone(),
        }
    }

    /// The chosen candidate, or the terminal failure explaining its absence.
    pub fn into_chosen(self) -> Result<Candidate, TerminalFailure> {
        if self.crawl_stop == CrawlStop::BootstrapEmpty {
            return Err(TerminalFailure::BootstrapFailure {
                pages_scanned: self.pages_scanned,
            });
        }
        self.chosen
            .ok_or(TerminalFailure::NoQualifyingCandidate {
                query: self.input_company,
                pages_scanned: self.pages_scanned,
                unique_titles: self.unique_titles_count,
                top_matches: self.top_matches,
            })
    }
}

/// Discovery output as handed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub status: SearchStatus,
    pub input_company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<DocType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_html_url: Option<String>,
    pub pages_scanned: usize,
    pub pagination_mode_used: String,
    pub unique_titles_count: usize,
    pub crawl_stop: CrawlStop,
    pub top_matches: Vec<TopMatch>,
}

/// Document link found on a filing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLink {
    /// Link as it appeared on the page, made absolute
    pub extracted: String,

    /// Direct link after unwrapping any proxy wrapper
    pub direct: String,
}

/// A validated document on disk plus its provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquisitionResult {
    pub source_link_extracted: String,
    pub source_link_resolved: String,
    pub saved_path: PathBuf,
    pub attempts: u32,
    pub size_bytes: u64,
    pub sha256: String,
    pub downloaded_at: DateTime<Utc>,
}
