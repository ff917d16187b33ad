// src/services/crawler.rs

//! Listing crawler service.
//!
//! Opens a listing session, then walks pages in order until a strong
//! prospectus match shows up, a page comes back empty or failing, or the page
//! limit is reached. Pages are fetched strictly one after another.

use std::collections::HashSet;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{Candidate, Config, CrawlStop, HttpConfig, ListingConfig, ListingEntry, Query};
use crate::services::{CandidateScorer, PageParser};
use crate::utils::{Deadline, Fetcher};

/// Everything a crawl produced.
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// One candidate per unique raw title, in discovery order
    pub candidates: Vec<Candidate>,
    /// Pages requested, bootstrap included, failed requests included
    pub pages_scanned: usize,
    pub stop: CrawlStop,
}

impl CrawlReport {
    pub fn unique_titles(&self) -> usize {
        self.candidates.len()
    }
}

#[derive(Default)]
struct CrawlState {
    candidates: Vec<Candidate>,
    seen_titles: HashSet<String>,
    best_prospectus_score: f64,
}

/// Service for crawling the paginated filings listing.
pub struct ListingCrawler<'a> {
    fetcher: &'a dyn Fetcher,
    listing: &'a ListingConfig,
    http: &'a HttpConfig,
    strong_match_threshold: f64,
    parser: PageParser,
    scorer: CandidateScorer,
}

impl<'a> ListingCrawler<'a> {
    /// Create a new listing crawler.
    pub fn new(fetcher: &'a dyn Fetcher, config: &'a Config) -> Result<Self> {
        Ok(Self {
            fetcher,
            listing: &config.listing,
            http: &config.http,
            strong_match_threshold: config.matching.strong_match_threshold,
            parser: PageParser::new(&config.listing)?,
            scorer: CandidateScorer::new(&config.matching),
        })
    }

    /// Crawl the listing and score every unique entry against `query`.
    ///
    /// Page failures end pagination but keep earlier results; only an
    /// expired deadline is returned as an error.
    pub async fn crawl(&self, query: &Query, deadline: Deadline) -> Result<CrawlReport> {
        let mut state = CrawlState::default();

        let page0 = match self.bootstrap(deadline).await {
            Ok(entries) => entries,
            Err(e @ AppError::DeadlineExceeded(_)) => return Err(e),
            Err(e) => {
                log::warn!("Listing bootstrap failed: {}", e);
                Vec::new()
            }
        };
        let mut pages_scanned = 1;

        if page0.is_empty() {
            log::warn!("Listing bootstrap yielded no entries");
            return Ok(CrawlReport {
                candidates: Vec::new(),
                pages_scanned,
                stop: CrawlStop::BootstrapEmpty,
            });
        }

        log::debug!("Page 0: {} entries", page0.len());
        self.absorb(query, page0, &mut state);

        let delay = Duration::from_millis(self.listing.page_delay_ms);
        let mut stop = CrawlStop::PagesExhausted;

        for page_index in 1..self.listing.max_pages {
            if state.best_prospectus_score >= self.strong_match_threshold {
                log::info!(
                    "Strong match ({:.4}) found, stopping after {} pages",
                    state.best_prospectus_score,
                    pages_scanned
                );
                stop = CrawlStop::EarlyExit;
                break;
            }

            deadline.sleep("listing page delay", delay).await?;
            let result = self.fetch_page(page_index, deadline).await;
            pages_scanned += 1;

            match result {
                Ok(entries) if entries.is_empty() => {
                    log::debug!("Page {} is empty, stopping", page_index);
                    stop = CrawlStop::PageEmpty;
                    break;
                }
                Ok(entries) => {
                    log::debug!("Page {}: {} entries", page_index, entries.len());
                    self.absorb(query, entries, &mut state);
                }
                Err(e @ AppError::DeadlineExceeded(_)) => return Err(e),
                Err(e) => {
                    log::warn!("Listing page {} failed, keeping partial results: {}", page_index, e);
                    stop = CrawlStop::PageFailed;
                    break;
                }
            }
        }

        Ok(CrawlReport {
            candidates: state.candidates,
            pages_scanned,
            stop,
        })
    }

    /// Fetch the main listing page; this also opens the cookie session.
    async fn bootstrap(&self, deadline: Deadline) -> Result<Vec<ListingEntry>> {
        let timeout = Duration::from_secs(self.http.listing_timeout_secs);
        let html = deadline
            .run(
                "listing bootstrap",
                self.fetcher.get_text(&self.listing.listing_url, None, timeout),
            )
            .await?;
        Ok(self.parser.parse(&html))
    }

    /// Fetch one page through the paging endpoint.
    async fn fetch_page(&self, page_index: usize, deadline: Deadline) -> Result<Vec<ListingEntry>> {
        let timeout = Duration::from_secs(self.http.listing_timeout_secs);
        let form = self.listing.page_form(page_index);
        let html = deadline
            .run(
                "listing page",
                self.fetcher.post_form(
                    &self.listing.ajax_url,
                    &form,
                    &self.listing.listing_url,
                    timeout,
                ),
            )
            .await?;
        Ok(self.parser.parse(&html))
    }

    /// Score entries whose raw title has not been seen yet.
    fn absorb(&self, query: &Query, entries: Vec<ListingEntry>, state: &mut CrawlState) {
        for entry in entries {
            if !state.seen_titles.insert(entry.title.clone()) {
                continue;
            }
            let (candidate, exact_score) = self.scorer.evaluate_exact(query, entry);
            log::debug!(
                "  {:.4} {:<11} {}",
                candidate.match_score,
                candidate.doc_type.as_str(),
                candidate.title_raw
            );
            // Early exit compares the unrounded score.
            if candidate.doc_type.is_selectable() && exact_score > state.best_prospectus_score {
                state.best_prospectus_score = exact_score;
            }
            state.candidates.push(candidate);
        }
    }
}
