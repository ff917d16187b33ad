//! Service layer for the finder.
//!
//! This module contains the business logic for:
//! - Query normalization (`QueryNormalizer`)
//! - Listing page parsing (`PageParser`)
//! - Title scoring (`CandidateScorer`)
//! - Listing pagination (`ListingCrawler`)
//! - Filing selection (`CandidateSelector`)
//! - Document link resolution (`PdfLinkResolver`)
//! - Validated downloads (`AcquisitionDownloader`)

mod crawler;
mod downloader;
mod normalizer;
mod parser;
mod resolver;
mod scorer;
mod selector;

pub use crawler::{CrawlReport, ListingCrawler};
pub use downloader::AcquisitionDownloader;
pub use normalizer::QueryNormalizer;
pub use parser::PageParser;
pub use resolver::PdfLinkResolver;
pub use scorer::CandidateScorer;
pub use selector::CandidateSelector;
