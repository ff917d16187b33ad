//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings and per-call timeouts
    #[serde(default)]
    pub http: HttpConfig,

    /// Filings listing endpoints and crawl bounds
    #[serde(default)]
    pub listing: ListingConfig,

    /// Fuzzy matching thresholds and stopwords
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Document link discovery markers
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// Download validation and retry policy
    #[serde(default)]
    pub download: DownloadConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, falling back to defaults if loading fails.
    ///
    /// The load error is handed back so the caller can report it once
    /// logging is up.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<AppError>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::config("http.user_agent is empty"));
        }
        if self.http.listing_timeout_secs == 0
            || self.http.page_timeout_secs == 0
            || self.http.download_timeout_secs == 0
        {
            return Err(AppError::config("http timeouts must be > 0"));
        }
        url::Url::parse(&self.listing.base_url)?;
        url::Url::parse(&self.listing.listing_url)?;
        url::Url::parse(&self.listing.ajax_url)?;
        if self.listing.max_pages == 0 {
            return Err(AppError::config("listing.max_pages must be > 0"));
        }
        if self.listing.entry_path_pattern.is_empty() {
            return Err(AppError::config("listing.entry_path_pattern is empty"));
        }

        let m = &self.matching;
        for (name, value) in [
            ("min_match_score", m.min_match_score),
            ("strong_match_threshold", m.strong_match_threshold),
            ("substring_boost", m.substring_boost),
            ("token_subset_boost", m.token_subset_boost),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::config(format!(
                    "matching.{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if m.top_n == 0 {
            return Err(AppError::config("matching.top_n must be > 0"));
        }

        if self.resolver.document_marker.is_empty() || self.resolver.wrapper_marker.is_empty() {
            return Err(AppError::config("resolver markers must not be empty"));
        }
        if self.download.magic.is_empty() {
            return Err(AppError::config("download.magic must not be empty"));
        }
        Ok(())
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    #[serde(default = "defaults::accept")]
    pub accept: String,

    #[serde(default = "defaults::accept_language")]
    pub accept_language: String,

    /// Timeout for listing bootstrap and page requests
    #[serde(default = "defaults::listing_timeout")]
    pub listing_timeout_secs: u64,

    /// Timeout for fetching a filing's HTML page
    #[serde(default = "defaults::page_timeout")]
    pub page_timeout_secs: u64,

    /// Timeout for the document download
    #[serde(default = "defaults::download_timeout")]
    pub download_timeout_secs: u64,

    /// Overall budget for one run; 0 disables the deadline
    #[serde(default)]
    pub run_deadline_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            accept: defaults::accept(),
            accept_language: defaults::accept_language(),
            listing_timeout_secs: defaults::listing_timeout(),
            page_timeout_secs: defaults::page_timeout(),
            download_timeout_secs: defaults::download_timeout(),
            run_deadline_secs: 0,
        }
    }
}

/// Filings listing endpoints and crawl bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Site root used to absolutize entry links
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Main listing page, fetched once to open the session
    #[serde(default = "defaults::listing_url")]
    pub listing_url: String,

    /// Paging endpoint taking a page index as form data
    #[serde(default = "defaults::ajax_url")]
    pub ajax_url: String,

    /// Path fragment every filing link contains
    #[serde(default = "defaults::entry_path_pattern")]
    pub entry_path_pattern: String,

    /// Suffix every filing link ends with
    #[serde(default = "defaults::entry_suffix")]
    pub entry_suffix: String,

    /// Upper bound on pages scanned, bootstrap page included
    #[serde(default = "defaults::max_pages")]
    pub max_pages: usize,

    /// Pause between consecutive page requests in milliseconds
    #[serde(default = "defaults::page_delay")]
    pub page_delay_ms: u64,

    #[serde(default = "defaults::sid")]
    pub sid: String,

    #[serde(default = "defaults::ssid")]
    pub ssid: String,

    #[serde(default = "defaults::smid")]
    pub smid: String,

    #[serde(default = "defaults::dept_id")]
    pub dept_id: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            listing_url: defaults::listing_url(),
            ajax_url: defaults::ajax_url(),
            entry_path_pattern: defaults::entry_path_pattern(),
            entry_suffix: defaults::entry_suffix(),
            max_pages: defaults::max_pages(),
            page_delay_ms: defaults::page_delay(),
            sid: defaults::sid(),
            ssid: defaults::ssid(),
            smid: defaults::smid(),
            dept_id: defaults::dept_id(),
        }
    }
}

impl ListingConfig {
    /// Form body requesting one page from the paging endpoint.
    pub fn page_form(&self, page_index: usize) -> Vec<(String, String)> {
        vec![
            ("sid".into(), self.sid.clone()),
            ("ssid".into(), self.ssid.clone()),
            ("smid".into(), self.smid.clone()),
            ("doDirect".into(), page_index.to_string()),
            ("next".into(), "n".into()),
            ("search".into(), String::new()),
            ("fromDate".into(), String::new()),
            ("toDate".into(), String::new()),
            ("deptId".into(), self.dept_id.clone()),
        ]
    }
}

/// Fuzzy matching thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum score for a candidate to be selectable
    #[serde(default = "defaults::min_match_score")]
    pub min_match_score: f64,

    /// Best RHP/DRHP score that stops pagination
    #[serde(default = "defaults::strong_match_threshold")]
    pub strong_match_threshold: f64,

    /// Floor applied when the query is a substring of the title
    #[serde(default = "defaults::substring_boost")]
    pub substring_boost: f64,

    /// Shortest normalized query eligible for the substring boost
    #[serde(default = "defaults::min_substring_len")]
    pub min_substring_len: usize,

    /// Floor applied when every query token appears in the title
    #[serde(default = "defaults::token_subset_boost")]
    pub token_subset_boost: f64,

    /// Length of the diagnostic top-matches list
    #[serde(default = "defaults::top_n")]
    pub top_n: usize,

    /// Noise words dropped from queries and titles
    #[serde(default = "defaults::stopwords")]
    pub stopwords: Vec<String>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            min_match_score: defaults::min_match_score(),
            strong_match_threshold: defaults::strong_match_threshold(),
            substring_boost: defaults::substring_boost(),
            min_substring_len: defaults::min_substring_len(),
            token_subset_boost: defaults::token_subset_boost(),
            top_n: defaults::top_n(),
            stopwords: defaults::stopwords(),
        }
    }
}

/// Markers used to find the document link on a filing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Substring identifying a direct document link
    #[serde(default = "defaults::document_marker")]
    pub document_marker: String,

    /// Substring identifying a proxy-wrapped link
    #[serde(default = "defaults::wrapper_marker")]
    pub wrapper_marker: String,

    /// Path fragment of the wrapper endpoint
    #[serde(default = "defaults::wrapper_path")]
    pub wrapper_path: String,

    /// Query parameter holding the real target
    #[serde(default = "defaults::wrapper_param")]
    pub wrapper_param: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            document_marker: defaults::document_marker(),
            wrapper_marker: defaults::wrapper_marker(),
            wrapper_path: defaults::wrapper_path(),
            wrapper_param: defaults::wrapper_param(),
        }
    }
}

/// Download validation and retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Directory downloaded documents are saved to
    #[serde(default = "defaults::output_dir")]
    pub output_dir: String,

    /// Retries after the first attempt
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Fixed pause between attempts in milliseconds
    #[serde(default = "defaults::retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Smallest acceptable artifact in bytes
    #[serde(default = "defaults::min_size_bytes")]
    pub min_size_bytes: u64,

    /// Expected leading bytes of the artifact
    #[serde(default = "defaults::magic")]
    pub magic: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::output_dir(),
            max_retries: defaults::max_retries(),
            retry_backoff_ms: defaults::retry_backoff(),
            min_size_bytes: defaults::min_size_bytes(),
            magic: defaults::magic(),
        }
    }
}

impl DownloadConfig {
    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
            .into()
    }
    pub fn accept() -> String {
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".into()
    }
    pub fn accept_language() -> String {
        "en-US,en;q=0.5".into()
    }
    pub fn listing_timeout() -> u64 {
        15
    }
    pub fn page_timeout() -> u64 {
        60
    }
    pub fn download_timeout() -> u64 {
        120
    }

    // Listing defaults
    pub fn base_url() -> String {
        "https://www.sebi.gov.in".into()
    }
    pub fn listing_url() -> String {
        "https://www.sebi.gov.in/sebiweb/home/HomeAction.do?doListing=yes&sid=3&ssid=15&smid=11"
            .into()
    }
    pub fn ajax_url() -> String {
        "https://www.sebi.gov.in/sebiweb/ajax/home/getnewslistinfo.jsp".into()
    }
    pub fn entry_path_pattern() -> String {
        "/filings/public-issues/".into()
    }
    pub fn entry_suffix() -> String {
        ".html".into()
    }
    pub fn max_pages() -> usize {
        10
    }
    pub fn page_delay() -> u64 {
        200
    }
    pub fn sid() -> String {
        "3".into()
    }
    pub fn ssid() -> String {
        "15".into()
    }
    pub fn smid() -> String {
        "11".into()
    }
    pub fn dept_id() -> String {
        "-1".into()
    }

    // Matching defaults
    pub fn min_match_score() -> f64 {
        0.65
    }
    pub fn strong_match_threshold() -> f64 {
        0.80
    }
    pub fn substring_boost() -> f64 {
        0.90
    }
    pub fn min_substring_len() -> usize {
        4
    }
    pub fn token_subset_boost() -> f64 {
        0.85
    }
    pub fn top_n() -> usize {
        5
    }
    pub fn stopwords() -> Vec<String> {
        [
            "rhp",
            "drhp",
            "limited",
            "ltd",
            "india",
            "indian",
            "private",
            "pvt",
            "company",
            "co",
            "industries",
            "industry",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    // Resolver defaults
    pub fn document_marker() -> String {
        ".pdf".into()
    }
    pub fn wrapper_marker() -> String {
        "web/?file=".into()
    }
    pub fn wrapper_path() -> String {
        "/web/?".into()
    }
    pub fn wrapper_param() -> String {
        "file".into()
    }

    // Download defaults
    pub fn output_dir() -> String {
        "data/pdfs".into()
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn retry_backoff() -> u64 {
        2000
    }
    pub fn min_size_bytes() -> u64 {
        50 * 1024
    }
    pub fn magic() -> String {
        "%PDF".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}
