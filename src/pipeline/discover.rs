// src/pipeline/discover.rs

//! Discovery pipeline: company name to chosen filing.

use crate::error::{AppError, Result};
use crate::models::{Config, SearchOutcome};
use crate::services::{CandidateSelector, ListingCrawler, QueryNormalizer};
use crate::utils::{Deadline, Fetcher};

/// Crawl the listing for `company` and pick the filing to acquire.
///
/// A query that normalizes to nothing is rejected before any request is
/// made. Not finding a filing is not an error here; the outcome says so and
/// carries the closest titles.
pub async fn run_discovery(
    fetcher: &dyn Fetcher,
    config: &Config,
    company: &str,
    deadline: Deadline,
) -> Result<SearchOutcome> {
    let query = QueryNormalizer::new(&config.matching).query(company);
    if query.normalized.is_empty() {
        return Err(AppError::InvalidQuery(company.to_string()));
    }
    log::info!(
        "Searching filings for '{}' (normalized '{}')",
        query.raw,
        query.normalized
    );

    let crawler = ListingCrawler::new(fetcher, config)?;
    let report = crawler.crawl(&query, deadline).await?;
    log::info!(
        "Scanned {} pages, {} unique titles ({:?})",
        report.pages_scanned,
        report.unique_titles(),
        report.stop
    );

    let outcome = CandidateSelector::new(&config.matching).select(company, report);
    match &outcome.chosen {
        Some(chosen) => log::info!(
            "Selected {} '{}' (score {:.4})",
            chosen.doc_type,
            chosen.title_raw,
            chosen.match_score
        ),
        None => log::info!("No qualifying filing for '{}'", company),
    }

    Ok(outcome)
}
