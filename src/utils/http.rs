// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{AppError, Result};
use crate::models::HttpConfig;

/// Network operations the finder needs.
///
/// One implementation instance is one listing session: cookies picked up by
/// the bootstrap request are replayed on later page requests.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// GET a page and return its body as text.
    async fn get_text(
        &self,
        url: &str,
        referer: Option<&str>,
        timeout: Duration,
    ) -> Result<String>;

    /// POST a form to an XHR endpoint and return the response body.
    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        referer: &str,
        timeout: Duration,
    ) -> Result<String>;

    /// Stream the body of `url` into `sink`, returning the bytes written.
    async fn download_to(
        &self,
        url: &str,
        referer: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
        timeout: Duration,
    ) -> Result<u64>;
}

/// Create a configured asynchronous HTTP client with a session cookie store.
pub fn create_async_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_str(&config.accept)
            .map_err(|e| AppError::config(format!("http.accept: {e}")))?,
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_str(&config.accept_language)
            .map_err(|e| AppError::config(format!("http.accept_language: {e}")))?,
    );

    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .default_headers(headers)
        .cookie_store(true)
        .build()?;
    Ok(client)
}

/// [`Fetcher`] backed by `reqwest`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
        })
    }

    /// Wrap an existing client; its cookie store becomes the session.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get_text(
        &self,
        url: &str,
        referer: Option<&str>,
        timeout: Duration,
    ) -> Result<String> {
        let mut request = self.client.get(url).timeout(timeout);
        if let Some(referer) = referer {
            request = request.header(header::REFERER, referer);
        }
        let text = request.send().await?.error_for_status()?.text().await?;
        Ok(text)
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(String, String)],
        referer: &str,
        timeout: Duration,
    ) -> Result<String> {
        let text = self
            .client
            .post(url)
            .timeout(timeout)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(header::REFERER, referer)
            .header(
                header::CONTENT_TYPE,
                "application/x-www-form-urlencoded; charset=UTF-8",
            )
            .form(form)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }

    async fn download_to(
        &self,
        url: &str,
        referer: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
        timeout: Duration,
    ) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .timeout(timeout)
            .header(header::REFERER, referer)
            .send()
            .await?
            .error_for_status()?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;
        Ok(written)
    }
}
