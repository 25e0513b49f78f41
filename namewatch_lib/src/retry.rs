//! Bounded retry with a fixed delay between attempts.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// How often and how patiently to retry a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Values below 1 act as 1.
    pub max_attempts: usize,
    /// Constant pause between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn immediate(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            delay: Duration::ZERO,
        }
    }
}

/// Runs `op` until it succeeds or `policy.max_attempts` is spent, sleeping
/// `policy.delay` between attempts. The last attempt's error is returned
/// unchanged.
pub async fn with_retry<T, E, F, Fut>(label: &str, policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0usize;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts {
                    return Err(err);
                }
                tracing::warn!(
                    "{} attempt {}/{} failed: {}. Retrying in {:.1}s",
                    label,
                    attempt,
                    max_attempts,
                    err,
                    policy.delay.as_secs_f64()
                );
                if !policy.delay.is_zero() {
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn succeeds_after_failures() {
        let calls = AtomicUsize::new(0);
        let result: Result<usize, String> = with_retry("op", &RetryPolicy::immediate(3), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(format!("fail {}", n))
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn returns_last_error_unchanged() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), String> = with_retry("op", &RetryPolicy::immediate(3), || async {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Err(format!("fail {}", n))
        })
        .await;
        assert_eq!(result, Err("fail 3".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let calls = AtomicUsize::new(0);
        let _: Result<(), String> = with_retry("op", &RetryPolicy::immediate(0), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err("nope".to_string())
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_fixed_delay_between_attempts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        };
        let start = tokio::time::Instant::now();
        let _: Result<(), String> = with_retry("op", &policy, || async { Err("x".to_string()) }).await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(11));
    }
}
