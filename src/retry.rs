//! Exponential backoff with jitter, shared by the worker-session manager
//! and the poller's send-with-backoff.

use std::time::Duration;

use rand::Rng;

/// Backoff schedule: `base * factor^attempt + U[0, jitter)`.
#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    /// Number of retries after the first attempt.
    pub max_retries: u32,
    /// Base delay for the first retry.
    pub base: Duration,
    /// Multiplicative growth factor per attempt.
    pub factor: f64,
    /// Upper bound (exclusive) of the uniform jitter added to each delay.
    pub jitter: Duration,
}

impl BackoffConfig {
    /// The schedule used for send-with-backoff and plugin call retries:
    /// base 1s, factor 2, jitter in `[0, 1s)`.
    pub fn standard(max_retries: u32) -> Self {
        Self {
            max_retries,
            base: Duration::from_secs(1),
            factor: 2.0,
            jitter: Duration::from_secs(1),
        }
    }

    /// The delay before the given zero-indexed retry attempt, including jitter.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.base.as_secs_f64() * self.factor.powi(attempt as i32);
        let jitter_secs = if self.jitter.is_zero() {
            0.0
        } else {
            rand::thread_rng().gen_range(0.0..self.jitter.as_secs_f64())
        };
        Duration::from_secs_f64(scaled + jitter_secs)
    }

    /// Total attempts including the first: `max_retries + 1`.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries + 1
    }
}

/// Whether an error kind should trigger a retry at all.
pub trait Transient {
    /// Returns true if this error represents a transient failure worth retrying.
    fn is_transient(&self) -> bool;
}

/// Runs `op` up to `config.total_attempts()` times, sleeping the backoff
/// delay between attempts whenever the error is [`Transient::is_transient`].
/// Returns the last error if every attempt is exhausted.
pub async fn retry<T, E, F, Fut>(config: &BackoffConfig, mut op: F) -> Result<T, E>
where
    E: Transient,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= config.max_retries || !err.is_transient() {
                    return Err(err);
                }
                tokio::time::sleep(config.delay_for_attempt(attempt)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_exponentially_ignoring_jitter_floor() {
        let config = BackoffConfig {
            max_retries: 3,
            base: Duration::from_secs(1),
            factor: 2.0,
            jitter: Duration::ZERO,
        };
        assert_eq!(config.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(config.delay_for_attempt(2), Duration::from_secs(4));
    }

    #[test]
    fn total_attempts_is_retries_plus_one() {
        assert_eq!(BackoffConfig::standard(3).total_attempts(), 4);
    }

    #[derive(Debug)]
    struct AlwaysTransient;

    impl Transient for AlwaysTransient {
        fn is_transient(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let config = BackoffConfig {
            max_retries: 3,
            base: Duration::from_millis(1),
            factor: 1.0,
            jitter: Duration::ZERO,
        };
        let mut calls = 0;
        let result: Result<u32, AlwaysTransient> = retry(&config, || {
            calls += 1;
            let calls = calls;
            async move {
                if calls < 3 {
                    Err(AlwaysTransient)
                } else {
                    Ok(calls)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn exhausts_after_total_attempts() {
        let config = BackoffConfig {
            max_retries: 2,
            base: Duration::from_millis(1),
            factor: 1.0,
            jitter: Duration::ZERO,
        };
        let mut calls = 0;
        let result: Result<u32, AlwaysTransient> = retry(&config, || {
            calls += 1;
            async move { Err(AlwaysTransient) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls, 3);
    }
}
