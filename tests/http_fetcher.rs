//! `HttpFetcher` against a local HTTP server.

use std::time::Duration;

use mockito::Matcher;
use rhp_finder::models::{Config, CrawlStop, SearchStatus};
use rhp_finder::pipeline::run_discovery;
use rhp_finder::utils::{Deadline, Fetcher, HttpFetcher};

const TIMEOUT: Duration = Duration::from_secs(5);

fn config_for(server_url: &str) -> Config {
    let mut config = Config::default();
    config.listing.base_url = server_url.to_string();
    config.listing.listing_url = format!("{server_url}/sebiweb/home/HomeAction.do?doListing=yes");
    config.listing.ajax_url = format!("{server_url}/sebiweb/ajax/home/getnewslistinfo.jsp");
    config.listing.page_delay_ms = 0;
    config
}

#[tokio::test]
async fn test_session_cookie_and_ajax_form() {
    let mut server = mockito::Server::new_async().await;
    let config = config_for(&server.url());

    let bootstrap = server
        .mock("GET", "/sebiweb/home/HomeAction.do")
        .match_query(Matcher::UrlEncoded("doListing".into(), "yes".into()))
        .with_header("set-cookie", "JSESSIONID=abc123; Path=/")
        .with_body(
            r#"<table><tr><td>
                 <a href="/filings/public-issues/jun-2024/bharti-hexacom-limited-rhp_1.html">Bharti Hexacom Limited - RHP</a>
               </td></tr></table>"#,
        )
        .create_async()
        .await;

    let page1 = server
        .mock("POST", "/sebiweb/ajax/home/getnewslistinfo.jsp")
        .match_header("x-requested-with", "XMLHttpRequest")
        .match_header("referer", config.listing.listing_url.as_str())
        .match_header("cookie", Matcher::Regex("JSESSIONID=abc123".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("doDirect".into(), "1".into()),
            Matcher::UrlEncoded("sid".into(), "3".into()),
            Matcher::UrlEncoded("ssid".into(), "15".into()),
            Matcher::UrlEncoded("smid".into(), "11".into()),
        ]))
        .with_body(
            r#"<a href="/filings/public-issues/jun-2024/awfis-space-solutions-limited-rhp_2.html">Awfis Space Solutions Limited - RHP</a>"#,
        )
        .create_async()
        .await;

    let fetcher = HttpFetcher::new(&config.http).unwrap();
    let outcome = run_discovery(&fetcher, &config, "Awfis", Deadline::none())
        .await
        .unwrap();

    bootstrap.assert_async().await;
    page1.assert_async().await;

    assert_eq!(outcome.status, SearchStatus::Ok);
    assert_eq!(outcome.crawl_stop, CrawlStop::EarlyExit);
    assert_eq!(outcome.pages_scanned, 2);
    let chosen = outcome.chosen.unwrap();
    assert_eq!(
        chosen.url,
        format!(
            "{}/filings/public-issues/jun-2024/awfis-space-solutions-limited-rhp_2.html",
            server.url()
        )
    );
}

#[tokio::test]
async fn test_failing_page_keeps_earlier_results() {
    let mut server = mockito::Server::new_async().await;
    let config = config_for(&server.url());

    server
        .mock("GET", "/sebiweb/home/HomeAction.do")
        .match_query(Matcher::Any)
        .with_body(
            r#"<a href="/filings/public-issues/x/zomato-limited-drhp_9.html">Zomato Limited - DRHP</a>"#,
        )
        .create_async()
        .await;
    server
        .mock("POST", "/sebiweb/ajax/home/getnewslistinfo.jsp")
        .with_status(500)
        .create_async()
        .await;

    let fetcher = HttpFetcher::new(&config.http).unwrap();
    let outcome = run_discovery(&fetcher, &config, "Awfis", Deadline::none())
        .await
        .unwrap();

    assert_eq!(outcome.crawl_stop, CrawlStop::PageFailed);
    assert_eq!(outcome.pages_scanned, 2);
    assert_eq!(outcome.unique_titles_count, 1);
}

#[tokio::test]
async fn test_download_streams_with_referer() {
    let mut server = mockito::Server::new_async().await;
    let mut body = b"%PDF-1.7\n".to_vec();
    body.resize(128 * 1024, b'x');

    let mock = server
        .mock("GET", "/sebi_data/attachdocs/a.pdf")
        .match_header("referer", "https://www.sebi.gov.in/filings/public-issues/a.html")
        .with_header("content-type", "application/pdf")
        .with_body(body.clone())
        .create_async()
        .await;

    let fetcher = HttpFetcher::new(&Config::default().http).unwrap();
    let mut sink = Vec::new();
    let written = fetcher
        .download_to(
            &format!("{}/sebi_data/attachdocs/a.pdf", server.url()),
            "https://www.sebi.gov.in/filings/public-issues/a.html",
            &mut sink,
            TIMEOUT,
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(written, body.len() as u64);
    assert_eq!(sink, body);
}

#[tokio::test]
async fn test_error_status_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/missing.html")
        .with_status(404)
        .create_async()
        .await;

    let fetcher = HttpFetcher::new(&Config::default().http).unwrap();
    let result = fetcher
        .get_text(&format!("{}/missing.html", server.url()), None, TIMEOUT)
        .await;
    assert!(result.is_err());
}
