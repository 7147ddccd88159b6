//! Bounded retry with backoff.
//!
//! The policy knows nothing about HTTP: it runs an async operation until it
//! succeeds or the attempt budget is spent, sleeping between attempts.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base * 2^n` after the failed attempt with zero-based index `n`.
    Exponential { base: Duration },
    /// The same delay after every failed attempt.
    Constant(Duration),
}

impl Backoff {
    /// Delay to wait after the attempt with zero-based index `attempt_index` failed.
    pub fn delay(&self, attempt_index: u32) -> Duration {
        match *self {
            Backoff::Exponential { base } => {
                base.saturating_mul(2u32.saturating_pow(attempt_index))
            }
            Backoff::Constant(delay) => delay,
        }
    }
}

/// Retry policy parameterized by attempt budget and backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::exponential(3, Duration::from_millis(1000))
    }
}

/// Final result of a retried operation.
#[derive(Debug)]
pub struct Retried<T, E> {
    pub result: Result<T, E>,
    /// Number of attempts actually made.
    pub attempts: u32,
}

impl RetryPolicy {
    /// Create a policy. At least one attempt is always made.
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn exponential(max_attempts: u32, base: Duration) -> Self {
        Self::new(max_attempts, Backoff::Exponential { base })
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Run `op` until it succeeds or the attempt budget is exhausted.
    ///
    /// `op` receives the zero-based attempt index. Attempts run strictly one
    /// after another; the last error is returned unchanged.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Retried<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 0;
        loop {
            debug!("Attempt {}/{}", attempt + 1, self.max_attempts);

            match op(attempt).await {
                Ok(value) => {
                    return Retried {
                        result: Ok(value),
                        attempts: attempt + 1,
                    }
                }
                Err(e) if attempt + 1 >= self.max_attempts => {
                    return Retried {
                        result: Err(e),
                        attempts: attempt + 1,
                    }
                }
                Err(e) => {
                    let delay = self.backoff.delay(attempt);
                    warn!(
                        "Attempt {}/{} failed: {}. Retrying in {}ms",
                        attempt + 1,
                        self.max_attempts,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    #[test]
    fn test_exponential_delays() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(1000),
        };
        assert_eq!(backoff.delay(0), Duration::from_secs(1));
        assert_eq!(backoff.delay(1), Duration::from_secs(2));
        assert_eq!(backoff.delay(2), Duration::from_secs(4));
    }

    #[test]
    fn test_constant_delay() {
        let backoff = Backoff::Constant(Duration::from_millis(250));
        assert_eq!(backoff.delay(0), backoff.delay(5));
    }

    #[test]
    fn test_at_least_one_attempt() {
        let policy = RetryPolicy::exponential(0, Duration::from_millis(10));
        assert_eq!(policy.max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_makes_exactly_max_attempts() {
        let policy = RetryPolicy::default();
        let started = Instant::now();
        let stamps = Arc::new(Mutex::new(Vec::new()));

        let outcome: Retried<(), String> = policy
            .run(|_| {
                let stamps = Arc::clone(&stamps);
                async move {
                    stamps.lock().unwrap().push(started.elapsed());
                    Err("down".to_string())
                }
            })
            .await;

        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.result.unwrap_err(), "down");

        let stamps = stamps.lock().unwrap();
        assert_eq!(stamps.len(), 3);
        let first_gap = stamps[1] - stamps[0];
        let second_gap = stamps[2] - stamps[1];
        assert!(first_gap >= Duration::from_secs(1) && first_gap < Duration::from_millis(1100));
        assert!(second_gap >= Duration::from_secs(2) && second_gap < Duration::from_millis(2100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_stops_retrying() {
        let policy = RetryPolicy::default();

        let outcome: Retried<u32, String> = policy
            .run(|attempt| async move {
                if attempt < 1 {
                    Err("flaky".to_string())
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert_eq!(outcome.attempts, 2);
        tokio_test::assert_ok!(outcome.result);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_after_final_attempt() {
        let policy = RetryPolicy::exponential(1, Duration::from_secs(10));
        let started = Instant::now();

        let outcome: Retried<(), &str> = policy.run(|_| async { Err("nope") }).await;

        assert_eq!(outcome.attempts, 1);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
