//! Bounded exponential-backoff retry shared by every retried step.

use crate::error::Cause;
use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    /// Upper bound on the time from the first attempt to the last one. A
    /// sleep that would end past it is never started.
    pub max_elapsed: Duration,
    pub factor: f32,
    pub max_retries: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(10),
            max_elapsed: Duration::from_secs(30),
            factor: 1.5,
            max_retries: 16,
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_interval)
            .with_max_delay(self.max_interval)
            .with_factor(self.factor)
            .with_max_times(self.max_retries)
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable cause,
    /// or the policy is exhausted (the last cause is returned).
    ///
    /// Firing `cancel`, before or during an attempt or a backoff sleep, ends
    /// the loop at once with [`Cause::Cancelled`].
    pub async fn run<T, F, Fut>(&self, cancel: &CancellationToken, label: &'static str, operation: F) -> Result<T, Cause>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, Cause>>,
    {
        if cancel.is_cancelled() {
            return Err(Cause::Cancelled);
        }

        let started = Instant::now();
        let max_elapsed = self.max_elapsed;
        let mut attempt = 1usize;

        let retrying = operation
            .retry(self.backoff())
            .when(Cause::is_retryable)
            .adjust(move |_: &Cause, delay: Option<Duration>| {
                delay.filter(|d| started.elapsed() + *d <= max_elapsed)
            })
            .notify(move |err: &Cause, delay: Duration| {
                warn!(attempt, retry_in = ?delay, error = %err, operation = label, "attempt failed, retrying");
                attempt += 1;
            });

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(operation = label, "retry loop cancelled");
                Err(Cause::Cancelled)
            }
            result = retrying => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn flaky(failures: usize, calls: Arc<AtomicUsize>) -> impl FnMut() -> std::future::Ready<Result<u32, Cause>> {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if n < failures {
                Err(Cause::ControlUnavailable("e2term busy".into()))
            } else {
                Ok(42)
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::default();
        let out = policy
            .run(&CancellationToken::new(), "flaky", flaky(2, calls.clone()))
            .await
            .unwrap();
        assert_eq!(out, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_fails_immediately() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let err = RetryPolicy::default()
            .run(&CancellationToken::new(), "parse", move || {
                c.fetch_add(1, Ordering::SeqCst);
                std::future::ready(Err::<(), _>(Cause::PayloadTooShort { len: 3, min: 10 }))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Cause::PayloadTooShort { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_elapsed() {
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy {
            max_elapsed: Duration::from_secs(5),
            max_retries: 1000,
            ..RetryPolicy::default()
        };
        let started = Instant::now();
        let err = policy
            .run(&CancellationToken::new(), "always_down", flaky(usize::MAX, calls.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, Cause::ControlUnavailable(_)));
        assert!(calls.load(Ordering::SeqCst) > 1);
        assert!(started.elapsed() <= policy.max_elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_policy_stays_within_budget() {
        // 1 + 1.5 + 2.25 + 3.375 + 5.0625 + 7.59375 = 20.78125s; the next
        // 10s sleep would cross 30s
        let calls = Arc::new(AtomicUsize::new(0));
        let policy = RetryPolicy::default();
        let started = Instant::now();
        let err = policy
            .run(&CancellationToken::new(), "always_down", flaky(usize::MAX, calls.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, Cause::ControlUnavailable(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 7);
        assert!(started.elapsed() > Duration::from_secs(20));
        assert!(started.elapsed() <= policy.max_elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff_is_terminal() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });

        let err = RetryPolicy::default()
            .run(&cancel, "always_down", flaky(usize::MAX, calls.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, Cause::Cancelled));
        // cancelled inside the first 1s sleep
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_already_cancelled_never_runs() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = RetryPolicy::default()
            .run(&cancel, "noop", flaky(0, calls.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err, Cause::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
