// src/utils/deadline.rs

//! Run-wide deadline threaded through every network call and sleep.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{AppError, Result};

/// Point in time after which a run gives up.
///
/// `Deadline::none()` never expires. Copies share the same instant, so one
/// value can be handed to every stage of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub fn none() -> Self {
        Self { at: None }
    }

    pub fn after(budget: Duration) -> Self {
        Self {
            at: Some(Instant::now() + budget),
        }
    }

    /// Deadline from a config value where 0 means unlimited.
    pub fn from_secs(secs: u64) -> Self {
        if secs == 0 {
            Self::none()
        } else {
            Self::after(Duration::from_secs(secs))
        }
    }

    /// Time left, `None` when unlimited.
    pub fn remaining(&self) -> Option<Duration> {
        self.at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.remaining() == Some(Duration::ZERO)
    }

    /// Fail fast if the deadline has already passed.
    pub fn check(&self, stage: &str) -> Result<()> {
        if self.is_expired() {
            return Err(AppError::DeadlineExceeded(stage.to_string()));
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the deadline passes first.
    pub async fn run<T, F>(&self, stage: &str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check(stage)?;
        match self.at {
            None => fut.await,
            Some(at) => tokio::time::timeout_at(at, fut)
                .await
                .map_err(|_| AppError::DeadlineExceeded(stage.to_string()))?,
        }
    }

    /// Sleep for `duration`, failing if the deadline would pass meanwhile.
    pub async fn sleep(&self, stage: &str, duration: Duration) -> Result<()> {
        if duration.is_zero() {
            return self.check(stage);
        }
        self.run(stage, async {
            tokio::time::sleep(duration).await;
            Ok(())
        })
        .await
    }
}
