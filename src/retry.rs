//! Retry helpers for fallible async operations.

use backoff::ExponentialBackoff;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use backoff::Error as BackoffError;

/// How often and how far apart an operation is attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryPolicy {
    /// Total number of calls, including the first one
    pub max_attempts: u32,
    #[serde(with = "secs")]
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            interval: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Constant interval between attempts; the attempt cap is enforced by
    /// [`retry_if`], not by elapsed time.
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.interval,
            initial_interval: self.interval,
            randomization_factor: 0.0,
            multiplier: 1.0,
            max_interval: self.interval,
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        }
    }
}

/// Run `operation` until it succeeds, fails with an error `should_retry`
/// rejects, or `policy.max_attempts` calls have been made. The last error is
/// returned unchanged.
pub async fn retry_if<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    should_retry: P,
    mut operation: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let should_retry = &should_retry;
    let mut attempt = 0u32;

    backoff::future::retry_notify(
        policy.backoff(),
        || {
            attempt += 1;
            let current = attempt;
            let call = operation();
            async move {
                match call.await {
                    Ok(value) => Ok(value),
                    Err(err) if current < max_attempts && should_retry(&err) => {
                        Err(BackoffError::transient(err))
                    }
                    Err(err) => Err(BackoffError::permanent(err)),
                }
            }
        },
        |err: E, wait: Duration| {
            warn!("Attempt failed, retrying in {:?}: {}", wait, err);
        },
    )
    .await
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum Failure {
        Busy,
        Fatal,
    }

    impl Display for Failure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = retry_if(&quick(5), |e: &Failure| *e == Failure::Busy, || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Failure::Busy)
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_predicate_rejection_stops_immediately() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let is_busy = |e: &Failure| *e == Failure::Busy;
        let result: Result<(), _> = retry_if(&quick(5), is_busy, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Failure::Fatal)
        })
        .await;

        assert_eq!(result, Err(Failure::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = retry_if(&quick(3), |_: &Failure| true, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Failure::Busy)
        })
        .await;

        assert_eq!(result, Err(Failure::Busy));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_calls_once() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let _: Result<(), Failure> = retry_if(&quick(0), |_: &Failure| true, || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(Failure::Busy)
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_policy_deserializes_seconds() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{"maxAttempts": 10, "interval": 360}"#).unwrap();
        assert_eq!(policy, RetryPolicy::new(10, Duration::from_secs(360)));

        let policy: RetryPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, RetryPolicy::default());
    }
}
