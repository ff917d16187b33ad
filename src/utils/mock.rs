//! Scripted fetcher for testing purposes.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{AppError, Result};
use crate::utils::http::Fetcher;

/// Canned reply for one request.
#[derive(Debug, Clone)]
pub enum MockReply {
    Body(String),
    Fail(String),
}

/// Canned payload for one download attempt.
#[derive(Debug, Clone)]
pub enum MockDownload {
    Bytes(Vec<u8>),
    Fail(String),
}

/// A request the mock received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRequest {
    Get { url: String },
    Page { index: usize },
    Download { url: String, referer: String },
}

/// A [`Fetcher`] that replays predefined responses.
///
/// GET requests are answered by URL, listing page requests by their
/// `doDirect` index (unknown pages come back empty), and downloads pop from a
/// queue in order.
#[derive(Debug, Default)]
pub struct MockFetcher {
    pages: Mutex<HashMap<String, MockReply>>,
    listing_pages: Mutex<HashMap<usize, MockReply>>,
    downloads: Mutex<VecDeque<MockDownload>>,
    requests: Mutex<Vec<MockRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockFetcher {
    /// Create a new mock fetcher with no responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer GET `url` with `body`.
    pub fn with_page(self, url: &str, body: impl Into<String>) -> Self {
        lock(&self.pages).insert(url.to_string(), MockReply::Body(body.into()));
        self
    }

    /// Fail GET `url`.
    pub fn with_failing_page(self, url: &str, message: &str) -> Self {
        lock(&self.pages).insert(url.to_string(), MockReply::Fail(message.to_string()));
        self
    }

    /// Answer the paging endpoint for `index` with `body`.
    pub fn with_listing_page(self, index: usize, body: impl Into<String>) -> Self {
        lock(&self.listing_pages).insert(index, MockReply::Body(body.into()));
        self
    }

    /// Fail the paging endpoint for `index`.
    pub fn with_failing_listing_page(self, index: usize, message: &str) -> Self {
        lock(&self.listing_pages).insert(index, MockReply::Fail(message.to_string()));
        self
    }

    /// Queue the payload for the next download attempt.
    pub fn push_download(self, download: MockDownload) -> Self {
        lock(&self.downloads).push_back(download);
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<MockRequest> {
        lock(&self.requests).clone()
    }

    /// Listing page indices requested through the paging endpoint.
    pub fn listing_pages_requested(&self) -> Vec<usize> {
        self.requests()
            .into_iter()
            .filter_map(|r| match r {
                MockRequest::Page { index } => Some(index),
                _ => None,
            })
            .collect()
    }

    /// Number of download attempts made.
    pub fn download_count(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| matches!(r, MockRequest::Download { .. }))
            .count()
    }

    fn record(&self, request: MockRequest) {
        lock(&self.requests).push(request);
    }

    fn reply(reply: Option<MockReply>, context: &str) -> Result<String> {
        match reply {
            Some(MockReply::Body(body)) => Ok(body),
            Some(MockReply::Fail(message)) => Err(AppError::fetch(context, message)),
            None => Err(AppError::fetch(context, "no mock response")),
        }
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn get_text(
        &self,
        url: &str,
        _referer: Option<&str>,
        _timeout: Duration,
    ) -> Result<String> {
        self.record(MockRequest::Get {
            url: url.to_string(),
        });
        let reply = lock(&self.pages).get(url).cloned();
        Self::reply(reply, url)
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        _referer: &str,
        _timeout: Duration,
    ) -> Result<String> {
        let index = form
            .iter()
            .find(|(k, _)| k == "doDirect")
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .ok_or_else(|| AppError::fetch(url, "form carries no page index"))?;
        self.record(MockRequest::Page { index });

        let reply = lock(&self.listing_pages).get(&index).cloned();
        match reply {
            None => Ok(String::new()),
            other => Self::reply(other, url),
        }
    }

    async fn download_to(
        &self,
        url: &str,
        referer: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
        _timeout: Duration,
    ) -> Result<u64> {
        self.record(MockRequest::Download {
            url: url.to_string(),
            referer: referer.to_string(),
        });
        let next = lock(&self.downloads).pop_front();
        match next {
            Some(MockDownload::Bytes(bytes)) => {
                sink.write_all(&bytes).await?;
                sink.flush().await?;
                Ok(bytes.len() as u64)
            }
            Some(MockDownload::Fail(message)) => Err(AppError::fetch(url, message)),
            None => Err(AppError::fetch(url, "no mock download queued")),
        }
    }
}

/// Build a listing fragment with one anchor per `(title, href)` pair.
pub fn listing_fragment(entries: &[(&str, &str)]) -> String {
    let rows: String = entries
        .iter()
        .map(|(title, href)| format!("<tr><td><a href=\"{href}\">{title}</a></td></tr>"))
        .collect();
    format!("<table>{rows}</table>")
}

/// A payload that passes validation: magic header padded to `size` bytes.
pub fn valid_document(size: usize) -> Vec<u8> {
    let mut bytes = b"%PDF-1.7\n".to_vec();
    bytes.resize(size.max(bytes.len()), b'0');
    bytes
}
