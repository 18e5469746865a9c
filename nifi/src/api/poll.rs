//! Fixed-interval polling for asynchronous server-side operations

use std::future::Future;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// What happens when a poll runs out of attempts without converging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhaustion {
    /// Log the timeout and let the caller carry on.
    Warn,
    /// Surface `Error::ConvergenceTimeout`.
    Fail,
}

#[derive(Debug, Clone)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
    pub deadline: Option<Duration>,
    pub on_exhausted: Exhaustion,
}

impl PollPolicy {
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
            deadline: None,
            on_exhausted: Exhaustion::Warn,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn failing(mut self) -> Self {
        self.on_exhausted = Exhaustion::Fail;
        self
    }

    /// Runs `probe` until it reports `true` or the budget is spent.
    ///
    /// Returns whether the operation converged. A probe error counts as
    /// "not yet" so a transient failure does not end the loop.
    pub async fn run<F, Fut>(&self, what: &str, mut probe: F) -> Result<bool>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<bool>>,
    {
        let started = Instant::now();

        for attempt in 1..=self.max_attempts {
            match probe(attempt).await {
                Ok(true) => return Ok(true),
                Ok(false) => tracing::debug!("Waiting for {} ({})...", what, attempt),
                Err(e) => tracing::debug!("Polling {} failed on attempt {}: {}", what, attempt, e),
            }

            if attempt == self.max_attempts {
                break;
            }
            if let Some(deadline) = self.deadline {
                if started.elapsed() + self.interval > deadline {
                    break;
                }
            }
            tokio::time::sleep(self.interval).await;
        }

        match self.on_exhausted {
            Exhaustion::Warn => {
                tracing::warn!("Gave up waiting for {}", what);
                Ok(false)
            }
            Exhaustion::Fail => Err(Error::ConvergenceTimeout {
                what: what.to_string(),
                attempts: self.max_attempts,
            }),
        }
    }
}
