//! Pipeline entry points.
//!
//! - `run_discovery`: Find the filing that best matches a company name
//! - `run_acquisition`: Download the document behind a filing page
//! - `run_pipeline`: Both, in order

pub mod acquire;
pub mod discover;
pub mod run;

pub use acquire::{acquire_candidate, document_path, run_acquisition};
pub use discover::run_discovery;
pub use run::{RunReport, run_pipeline};
