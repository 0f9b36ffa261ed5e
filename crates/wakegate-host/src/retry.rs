//! Bounded-retry combinator shared by the boot and shutdown paths.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

/// Fixed-delay retry policy: up to `max_attempts` tries with `backoff`
/// between consecutive failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }
}

/// Drive `attempt` until it reports success or the policy is exhausted.
///
/// `attempt` receives the 1-based attempt number and returns whether that
/// attempt succeeded; it embeds its own confirmation logic (a boot attempt
/// counts as successful only once the host answers a probe). Returns `true`
/// on success, `false` when every attempt failed — never an error, because
/// exhausting retries is not fatal to the caller's loop.
pub async fn with_retries<F, Fut>(policy: RetryPolicy, label: &str, mut attempt: F) -> bool
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = bool>,
{
    for n in 1..=policy.max_attempts {
        info!(attempt = n, max = policy.max_attempts, "{label} attempt");
        if attempt(n).await {
            info!(attempt = n, "{label} succeeded");
            return true;
        }
        if n < policy.max_attempts {
            tokio::time::sleep(policy.backoff).await;
        }
    }
    warn!(attempts = policy.max_attempts, "all {label} attempts failed");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn stops_on_first_success() {
        let calls = AtomicU32::new(0);
        let ok = with_retries(
            RetryPolicy::new(3, Duration::from_secs(3)),
            "boot",
            |_attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { true }
            },
        )
        .await;
        assert!(ok);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_all_attempts_on_persistent_failure() {
        let calls = AtomicU32::new(0);
        let ok = with_retries(
            RetryPolicy::new(3, Duration::from_secs(3)),
            "shutdown",
            |_attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { false }
            },
        )
        .await;
        assert!(!ok);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_midway_through_the_budget() {
        let ok = with_retries(
            RetryPolicy::new(3, Duration::from_millis(10)),
            "boot",
            |attempt| async move { attempt == 2 },
        )
        .await;
        assert!(ok);
    }

    #[tokio::test(start_paused = true)]
    async fn attempt_numbers_are_one_based_and_sequential() {
        let seen = std::sync::Mutex::new(Vec::new());
        with_retries(
            RetryPolicy::new(3, Duration::from_millis(1)),
            "boot",
            |attempt| {
                seen.lock().unwrap().push(attempt);
                async { false }
            },
        )
        .await;
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
    }
}
