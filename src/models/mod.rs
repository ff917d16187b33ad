//! Domain models for the finder.
//!
//! This module contains all data structures used throughout the crate,
//! organized by their primary purpose.

mod config;
mod filing;
mod outcome;

// Re-export all public types
pub use config::{
    Config, DownloadConfig, HttpConfig, ListingConfig, LoggingConfig, MatchingConfig,
    ResolverConfig,
};
pub use filing::{Candidate, DocType, ListingEntry, Query};
pub use outcome::{
    AcquisitionResult, CrawlStop, DiscoveryReport, PAGINATION_MODE, ResolvedLink, SearchOutcome,
    SearchStatus, TopMatch,
};
