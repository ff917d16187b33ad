// src/pipeline/run.rs

//! Full run: discovery followed by acquisition.

use serde::Serialize;

use crate::error::Result;
use crate::models::{AcquisitionResult, Config, DiscoveryReport};
use crate::pipeline::{acquire_candidate, run_discovery};
use crate::utils::{Deadline, Fetcher};

/// What a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub discovery: DiscoveryReport,
    pub acquisition: AcquisitionResult,
}

/// Find the filing for `company` and download its document.
///
/// Every way of ending without a document surfaces as an
/// [`AppError::Terminal`](crate::error::AppError::Terminal).
pub async fn run_pipeline(
    fetcher: &dyn Fetcher,
    config: &Config,
    company: &str,
    deadline: Deadline,
) -> Result<RunReport> {
    let outcome = run_discovery(fetcher, config, company, deadline).await?;
    let discovery = outcome.report();
    let candidate = outcome.into_chosen()?;

    let acquisition = acquire_candidate(fetcher, config, company, &candidate, deadline).await?;
    Ok(RunReport {
        discovery,
        acquisition,
    })
}
