use std::future::Future;
use std::time::Duration;

use log::warn;

use crate::error::AuditError;

/// Bounded exponential backoff for transient upstream failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first; values below 1 mean a single try.
    pub attempts: u32,
    /// Delay before the second attempt; doubles after each retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            attempts: 4,
            base_delay: Duration::from_millis(250),
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or the attempts are
/// exhausted. Only errors classified as transient are retried.
pub async fn with_retry<T, F, Fut>(
    what: &str,
    policy: RetryPolicy,
    mut op: F,
) -> Result<T, AuditError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AuditError>>,
{
    let mut delay = policy.base_delay;
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.attempts => {
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    what, attempt, policy.attempts, delay, err
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
