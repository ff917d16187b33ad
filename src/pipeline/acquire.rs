// src/pipeline/acquire.rs

//! Acquisition pipeline: filing page to validated document on disk.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result, TerminalFailure};
use crate::models::{AcquisitionResult, Candidate, Config};
use crate::services::{AcquisitionDownloader, PdfLinkResolver};
use crate::utils::{Deadline, Fetcher, safe_filename};

/// The filing page being acquired and how it was found.
struct FilingPage<'a> {
    url: &'a str,
    title: &'a str,
    score: Option<f64>,
}

impl FilingPage<'_> {
    fn link_failure(&self, reason: impl Into<String>) -> AppError {
        TerminalFailure::LinkExtractionFailure {
            title: self.title.to_string(),
            score: self.score,
            page_url: self.url.to_string(),
            reason: reason.into(),
        }
        .into()
    }
}

/// Destination of the document downloaded for `company`.
pub fn document_path(config: &Config, company: &str) -> PathBuf {
    PathBuf::from(&config.download.output_dir).join(format!("{}.pdf", safe_filename(company)))
}

/// Download the document linked from the filing page at `page_url`.
pub async fn run_acquisition(
    fetcher: &dyn Fetcher,
    config: &Config,
    company: &str,
    page_url: &str,
    deadline: Deadline,
) -> Result<AcquisitionResult> {
    let page = FilingPage {
        url: page_url,
        title: company,
        score: None,
    };
    acquire(fetcher, config, company, page, deadline).await
}

/// Download the document of a candidate chosen by discovery.
pub async fn acquire_candidate(
    fetcher: &dyn Fetcher,
    config: &Config,
    company: &str,
    candidate: &Candidate,
    deadline: Deadline,
) -> Result<AcquisitionResult> {
    let page = FilingPage {
        url: &candidate.url,
        title: &candidate.title_raw,
        score: Some(candidate.match_score),
    };
    acquire(fetcher, config, company, page, deadline).await
}

async fn acquire(
    fetcher: &dyn Fetcher,
    config: &Config,
    company: &str,
    page: FilingPage<'_>,
    deadline: Deadline,
) -> Result<AcquisitionResult> {
    log::info!("Fetching filing page {}", page.url);
    let timeout = Duration::from_secs(config.http.page_timeout_secs);
    let fetched = deadline
        .run(
            "filing page",
            fetcher.get_text(page.url, Some(&config.listing.listing_url), timeout),
        )
        .await;
    let html = match fetched {
        Ok(html) => html,
        Err(e @ AppError::DeadlineExceeded(_)) => return Err(e),
        Err(e) => return Err(page.link_failure(e.to_string())),
    };

    let link = PdfLinkResolver::new(&config.resolver)
        .resolve(&html, page.url)
        .ok_or_else(|| page.link_failure("no document link on page"))?;
    if link.extracted != link.direct {
        log::debug!("Unwrapped {} -> {}", link.extracted, link.direct);
    }
    log::info!("Document link: {}", link.direct);

    let dest = document_path(config, company);
    let timeout = Duration::from_secs(config.http.download_timeout_secs);
    AcquisitionDownloader::new(fetcher, &config.download, timeout)
        .download(&link, page.url, &dest, deadline)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::mock::{MockDownload, MockFetcher, valid_document};

    const PAGE: &str = "https://www.sebi.gov.in/filings/public-issues/jun-2024/awfis_1.html";

    fn config(dir: &std::path::Path) -> Config {
        let mut config = Config::default();
        config.download.output_dir = dir.display().to_string();
        config.download.retry_backoff_ms = 0;
        config
    }

    #[test]
    fn test_document_path_is_safe() {
        let mut config = Config::default();
        config.download.output_dir = "out".into();
        assert_eq!(
            document_path(&config, "Awfis Space (India) Ltd."),
            PathBuf::from("out").join("awfis_space_india_ltd.pdf")
        );
    }

    #[tokio::test]
    async fn test_page_fetch_failure_is_link_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let mock = MockFetcher::new().with_failing_page(PAGE, "HTTP 503");

        let err = run_acquisition(&mock, &config, "Awfis", PAGE, Deadline::none())
            .await
            .unwrap_err();
        match err.terminal() {
            Some(TerminalFailure::LinkExtractionFailure {
                page_url, reason, score, ..
            }) => {
                assert_eq!(page_url, PAGE);
                assert!(reason.contains("HTTP 503"));
                assert_eq!(*score, None);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(mock.download_count(), 0);
    }

    #[tokio::test]
    async fn test_page_without_link() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let mock = MockFetcher::new().with_page(PAGE, "<p>Nothing to see</p>");

        let err = run_acquisition(&mock, &config, "Awfis", PAGE, Deadline::none())
            .await
            .unwrap_err();
        assert_eq!(err.terminal().map(|t| t.code()), Some("LINK_NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_wrapped_link_is_downloaded_with_page_referer() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let html = r#"<iframe src="https://www.sebi.gov.in/web/?file=https://www.sebi.gov.in/sebi_data/attachdocs/awfis.pdf"></iframe>"#;
        let mock = MockFetcher::new()
            .with_page(PAGE, html)
            .push_download(MockDownload::Bytes(valid_document(64 * 1024)));

        let result = run_acquisition(&mock, &config, "Awfis", PAGE, Deadline::none())
            .await
            .unwrap();

        assert_eq!(
            result.source_link_resolved,
            "https://www.sebi.gov.in/sebi_data/attachdocs/awfis.pdf"
        );
        assert!(result.source_link_extracted.contains("web/?file="));
        assert_eq!(result.saved_path, dir.path().join("awfis.pdf"));
        assert!(result.saved_path.is_file());
        assert!(mock.requests().contains(&crate::utils::mock::MockRequest::Download {
            url: "https://www.sebi.gov.in/sebi_data/attachdocs/awfis.pdf".into(),
            referer: PAGE.into(),
        }));
    }
}
