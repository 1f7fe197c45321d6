//! Bounded retry with exponential backoff and a per-attempt deadline.

use std::{future::Future, time::Duration};

use ai_llm_service::AiLlmError;
use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::error::SearchError;

/// Retry knobs for provider calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubled on every further retry.
    pub base_delay: Duration,
    /// Deadline for a single attempt.
    pub call_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            call_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << attempt.min(16))
    }
}

/// Runs `call` until it succeeds, fails permanently, or retries run out.
///
/// Only [`AiLlmError::is_transient`] failures are retried. An attempt that
/// exceeds `call_timeout` counts as a transient timeout.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    stage: &'static str,
    mut call: F,
) -> Result<T, SearchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AiLlmError>>,
{
    let mut attempt = 0u32;
    loop {
        let outcome = match timeout(policy.call_timeout, call()).await {
            Ok(r) => r,
            Err(_) => Err(AiLlmError::Timeout(policy.call_timeout)),
        };

        match outcome {
            Ok(v) => return Ok(v),
            Err(e) if e.is_transient() && attempt < policy.max_retries => {
                let delay = policy.backoff(attempt);
                warn!(
                    stage,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient provider failure, retrying"
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(AiLlmError::Timeout(after)) => return Err(SearchError::Timeout { stage, after }),
            Err(source) => return Err(SearchError::Llm { stage, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::error_handler::{Provider, ProviderError, ProviderErrorKind};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(100),
            call_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn backoff_doubles() {
        let p = policy(3);
        assert_eq!(p.backoff(0), Duration::from_millis(100));
        assert_eq!(p.backoff(2), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let calls = AtomicU32::new(0);
        let out = with_retry(&policy(2), "explanation", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(AiLlmError::Timeout(Duration::from_millis(5)))
                } else {
                    Ok("done")
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(out, "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let err = with_retry(&policy(3), "summary", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err::<String, _>(AiLlmError::from(ProviderError::new(
                    Provider::OpenAI,
                    ProviderErrorKind::UnrecognizedShape("number".into()),
                )))
            }
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, SearchError::Llm { stage: "summary", .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_call_times_out() {
        let err = with_retry(&policy(1), "explanation", || async {
            std::future::pending::<Result<String, AiLlmError>>().await
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            SearchError::Timeout { stage: "explanation", after } if after == Duration::from_secs(1)
        ));
    }
}
