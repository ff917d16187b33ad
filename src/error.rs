// src/error.rs

//! Unified error handling for discovery and acquisition.
//!
//! [`AppError`] covers infrastructure failures (I/O, HTTP, configuration,
//! deadlines). [`TerminalFailure`] is the closed set of outcomes a run can
//! end in without a downloaded artifact; it travels inside
//! [`AppError::Terminal`] so callers can match on it.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::models::TopMatch;

/// Result type alias for finder operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The company name normalized to nothing
    #[error("Invalid query '{0}': nothing left to match after normalization")]
    InvalidQuery(String),

    /// A single fetch failed
    #[error("Fetch error for {context}: {message}")]
    Fetch { context: String, message: String },

    /// The caller's deadline ran out
    #[error("Deadline exceeded during {0}")]
    DeadlineExceeded(String),

    /// The run ended without an artifact
    #[error(transparent)]
    Terminal(#[from] TerminalFailure),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a fetch error with context.
    pub fn fetch(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// The terminal failure carried by this error, if any.
    pub fn terminal(&self) -> Option<&TerminalFailure> {
        match self {
            Self::Terminal(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Why a download attempt was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing was written to the destination
    Missing,
    /// The payload is below the minimum size (likely an HTML error page)
    TooSmall { size: u64, min: u64 },
    /// The leading bytes are not the expected magic signature
    BadSignature { found: Vec<u8> },
    /// Transport-level failure before validation
    Network(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "file missing after download"),
            Self::TooSmall { size, min } => {
                write!(f, "file too small ({size} bytes, need at least {min})")
            }
            Self::BadSignature { found } => {
                write!(f, "invalid header {:?}", String::from_utf8_lossy(found))
            }
            Self::Network(message) => write!(f, "network error: {message}"),
        }
    }
}

/// Terminal failure kinds of a discovery + acquisition run.
#[derive(Error, Debug)]
pub enum TerminalFailure {
    /// The bootstrap listing fetch failed or returned no entries.
    #[error("listing bootstrap yielded no entries (pages scanned: {pages_scanned})")]
    BootstrapFailure { pages_scanned: usize },

    /// No RHP/DRHP candidate cleared the minimum score.
    #[error(
        "no RHP/DRHP filing matched '{query}' after scanning {pages_scanned} pages \
         ({unique_titles} titles)"
    )]
    NoQualifyingCandidate {
        query: String,
        pages_scanned: usize,
        unique_titles: usize,
        top_matches: Vec<TopMatch>,
    },

    /// A candidate was chosen but its page exposes no document link.
    #[error("no document link found on {page_url} for '{title}': {reason}")]
    LinkExtractionFailure {
        title: String,
        /// Match score when the page came from discovery
        score: Option<f64>,
        page_url: String,
        reason: String,
    },

    /// Every download attempt failed validation.
    #[error("download of {url} failed after {attempts} attempts: {reason}")]
    ValidationFailure {
        url: String,
        attempts: u32,
        reason: RejectReason,
    },
}

impl TerminalFailure {
    /// Stable status code reported to callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BootstrapFailure { .. } | Self::NoQualifyingCandidate { .. } => "NOT_FOUND",
            Self::LinkExtractionFailure { .. } => "LINK_NOT_FOUND",
            Self::ValidationFailure { .. } => "DOWNLOAD_FAILED",
        }
    }

    /// Serializable summary, including suggestions when nothing matched.
    pub fn report(&self) -> FailureReport {
        let top_matches = match self {
            Self::NoQualifyingCandidate { top_matches, .. } => top_matches.clone(),
            _ => Vec::new(),
        };
        FailureReport {
            code: self.code(),
            message: self.to_string(),
            top_matches,
        }
    }
}

/// What a caller is shown when a run ends without a document.
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub top_matches: Vec<TopMatch>,
}
