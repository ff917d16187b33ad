//! Candidate selection.

use crate::models::{Candidate, MatchingConfig, SearchOutcome, SearchStatus, TopMatch};
use crate::services::CrawlReport;

/// Picks the single admissible filing and the diagnostic shortlist.
#[derive(Debug, Clone)]
pub struct CandidateSelector {
    min_match_score: f64,
    top_n: usize,
}

impl CandidateSelector {
    pub fn new(config: &MatchingConfig) -> Self {
        Self {
            min_match_score: config.min_match_score,
            top_n: config.top_n,
        }
    }

    /// Highest scoring candidates of any type, best first.
    ///
    /// Ties keep discovery order.
    pub fn top_matches(&self, candidates: &[Candidate]) -> Vec<TopMatch> {
        let mut ranked: Vec<&Candidate> = candidates.iter().collect();
        ranked.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
        ranked
            .into_iter()
            .take(self.top_n)
            .map(TopMatch::from)
            .collect()
    }

    /// The best RHP/DRHP candidate at or above the minimum score.
    ///
    /// Document type dominates: any qualifying RHP beats every DRHP, whatever
    /// their scores. Score only orders candidates of the same type.
    pub fn choose(&self, candidates: &[Candidate]) -> Option<Candidate> {
        let mut eligible: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| c.doc_type.is_selectable() && c.match_score >= self.min_match_score)
            .collect();

        eligible.sort_by(|a, b| {
            b.doc_type
                .priority()
                .cmp(&a.doc_type.priority())
                .then(b.match_score.total_cmp(&a.match_score))
        });
        eligible.first().map(|c| (*c).clone())
    }

    /// Turn a finished crawl into the discovery outcome.
    pub fn select(&self, input_company: &str, report: CrawlReport) -> SearchOutcome {
        let top_matches = self.top_matches(&report.candidates);
        let chosen = self.choose(&report.candidates);
        SearchOutcome {
            status: if chosen.is_some() {
                SearchStatus::Ok
            } else {
                SearchStatus::NotFound
            },
            input_company: input_company.to_string(),
            chosen,
            top_matches,
            pages_scanned: report.pages_scanned,
            unique_titles_count: report.unique_titles(),
            crawl_stop: report.stop,
        }
    }
}
