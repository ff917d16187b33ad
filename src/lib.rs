// src/lib.rs

//! RHP Finder Library
//!
//! Finds a company's offering prospectus (RHP, or DRHP as fallback) in the
//! SEBI public issues listing and downloads the document behind it.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod utils;
