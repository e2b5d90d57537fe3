//! Fixed-count, fixed-backoff retry for host creation requests.
//!
//! Rate limiting waits longer than other transient failures. Errors that a
//! resubmission cannot fix (bad input, missing pages) fail immediately.

use std::time::Duration;

use tracing::warn;

use crate::{
    core::{config::EngineConfig, errors::AppError, errors::AppResult, run_log::RunLog},
    host::{HostRequest, SlideHost},
};

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
    pub rate_limit_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for RetryPolicy {
    fn from(config: &EngineConfig) -> Self {
        Self {
            attempts: config.retry_attempts.max(1),
            backoff: config.retry_backoff,
            rate_limit_backoff: config.rate_limit_backoff,
        }
    }
}

fn worth_retrying(err: &AppError) -> bool {
    err.retryable() || matches!(err, AppError::Host(_))
}

/// Submits the requests produced by `build` until the host accepts them.
///
/// `build` receives the 0-based attempt number and the error of the previous
/// attempt, so callers can adjust the payload (for example a fallback URL).
/// Returns the number of attempts used.
pub async fn submit_with_retry<H, F>(
    host: &mut H,
    build: F,
    policy: RetryPolicy,
    context: &str,
    log: &mut RunLog,
) -> AppResult<u32>
where
    H: SlideHost,
    F: Fn(u32, Option<&AppError>) -> Vec<HostRequest>,
{
    let mut last_error: Option<AppError> = None;
    for attempt in 0..policy.attempts {
        let requests = build(attempt, last_error.as_ref());
        match host.batch_update(requests).await {
            Ok(()) => return Ok(attempt + 1),
            Err(err) if !worth_retrying(&err) => {
                warn!("{}: non-retriable error: {}", context, err);
                return Err(err);
            }
            Err(err) => {
                let remaining = policy.attempts - attempt - 1;
                log.warn(format!(
                    "{context}: attempt {} failed ({err}), {remaining} left",
                    attempt + 1
                ));
                if remaining > 0 {
                    let delay = if matches!(err, AppError::HostRateLimited) {
                        policy.rate_limit_backoff
                    } else {
                        policy.backoff
                    };
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(err);
            }
        }
    }

    warn!("{}: failed after {} attempts", context, policy.attempts);
    Err(last_error
        .unwrap_or_else(|| AppError::Internal(format!("{context}: no attempt was made"))))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{submit_with_retry, RetryPolicy};
    use crate::{
        core::{errors::AppError, run_log::RunLog, types::Slide},
        host::{memory::InMemoryDeck, HostRequest},
    };

    fn policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            backoff: Duration::ZERO,
            rate_limit_backoff: Duration::ZERO,
        }
    }

    fn create(id: &str) -> Vec<HostRequest> {
        vec![HostRequest::CreateSlide {
            object_id: id.to_string(),
            layout_id: None,
            insertion_index: 0,
        }]
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let mut deck = InMemoryDeck::new("doc", vec![Slide::new("a", vec![])]);
        deck.fail_next_batches(2);
        let mut log = RunLog::new();

        let attempts = submit_with_retry(&mut deck, |_, _| create("new"), policy(), "create", &mut log)
            .await
            .expect("third attempt succeeds");

        assert_eq!(attempts, 3);
        assert_eq!(deck.slide_ids(), vec!["new", "a"]);
    }

    #[tokio::test]
    async fn exhausted_attempts_return_last_error() {
        let mut deck = InMemoryDeck::new("doc", vec![]);
        deck.rate_limit_next_batches(5);
        let mut log = RunLog::new();

        let err = submit_with_retry(&mut deck, |_, _| create("new"), policy(), "create", &mut log)
            .await
            .expect_err("all attempts rate limited");

        assert!(matches!(err, AppError::HostRateLimited));
        assert!(deck.slide_ids().is_empty());
    }
}
