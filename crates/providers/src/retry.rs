//! Retry executor with jittered exponential back-off.
//!
//! One call moves through `Attempting(n)` until it succeeds, hits a
//! non-retryable error, or runs out of attempts. The sleep between attempts
//! goes through a [`Sleeper`] so tests can observe delays without waiting.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use rand::Rng;

use gr_domain::config::ImageConfig;
use gr_domain::error::Error;
use gr_domain::trace::TraceEvent;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Policy
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Always at least 1.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles for each later one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(cfg: &ImageConfig) -> Self {
        Self::new(cfg.max_attempts, Duration::from_millis(cfg.base_delay_ms))
    }

    /// Deterministic part of the delay after failed attempt `attempt`
    /// (1-indexed): `base_delay * 2^(attempt - 1)`.
    pub fn backoff_floor(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exp)
    }

    /// Full delay: the floor plus up to one second of uniform jitter.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let jitter_ms = rand::thread_rng().gen_range(0..1000u64);
        self.backoff_floor(attempt) + Duration::from_millis(jitter_ms)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sleeper
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

/// Records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        self.delays.lock().push(delay);
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Outcome
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug)]
pub enum RetryError {
    /// The error was not worth retrying.
    Terminal(Error),
    /// Every attempt failed with a retryable error.
    Exhausted { attempts: u32, last: Error },
}

impl RetryError {
    /// The error of the final attempt.
    pub fn last(&self) -> &Error {
        match self {
            RetryError::Terminal(e) => e,
            RetryError::Exhausted { last, .. } => last,
        }
    }

    pub fn into_error(self) -> Error {
        match self {
            RetryError::Terminal(e) => e,
            RetryError::Exhausted { attempts, last } => Error::RetryExhausted {
                attempts,
                last: last.to_string(),
            },
        }
    }
}

#[derive(Debug)]
pub struct RetryReport<T> {
    /// Attempts actually made.
    pub attempts: u32,
    pub result: std::result::Result<T, RetryError>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Executor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { policy, sleeper }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `op` until it succeeds or the policy says stop. `op` receives
    /// the 1-indexed attempt number.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> RetryReport<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = gr_domain::Result<T>>,
    {
        let max = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let err = match op(attempt).await {
                Ok(value) => {
                    return RetryReport {
                        attempts: attempt,
                        result: Ok(value),
                    }
                }
                Err(e) => e,
            };

            if !err.is_retryable() {
                tracing::warn!(operation, attempt, error = %err, "non-retryable failure");
                return RetryReport {
                    attempts: attempt,
                    result: Err(RetryError::Terminal(err)),
                };
            }

            if attempt >= max {
                TraceEvent::RetryGaveUp {
                    operation: operation.to_owned(),
                    attempts: attempt,
                    error: err.to_string(),
                }
                .emit();
                return RetryReport {
                    attempts: attempt,
                    result: Err(RetryError::Exhausted {
                        attempts: attempt,
                        last: err,
                    }),
                };
            }

            let delay = self.policy.delay_after(attempt);
            TraceEvent::RetryScheduled {
                operation: operation.to_owned(),
                attempt,
                max_attempts: max,
                delay_ms: delay.as_millis() as u64,
                error: err.to_string(),
            }
            .emit();
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}
