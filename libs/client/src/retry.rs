use std::future::Future;
use std::time::Duration;

use agora_core::CanonicalError;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::strategy::Verdict;

/// Attempt budget of a single call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryBudget {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

/// Drive `attempt` until it succeeds, fails with a final verdict, or the
/// budget runs out.
///
/// Only [`Verdict::Retry`] failures are retried, each after `budget.delay`.
/// An exhausted budget is reported as [`CanonicalError::Timeout`].
pub async fn run<T, F, Fut>(
    budget: RetryBudget,
    classify: impl Fn(&Error) -> Verdict,
    mut attempt: F,
) -> std::result::Result<T, CanonicalError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = budget.max_attempts.max(1);

    for n in 1..=max_attempts {
        let error = match attempt(n).await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        match classify(&error) {
            Verdict::Fail(code) => {
                debug!(attempt = n, %error, "call rejected");
                return Err(code);
            }
            Verdict::Retry => {
                warn!(attempt = n, max_attempts, %error, "transport failure");
                if n < max_attempts {
                    tokio::time::sleep(budget.delay).await;
                }
            }
        }
    }

    Err(CanonicalError::Timeout)
}
