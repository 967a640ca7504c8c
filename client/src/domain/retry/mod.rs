//! Bounded exponential-backoff retries around a single channel attempt.
//!
//! The engine knows nothing about channels or credentials. It repeats an
//! attempt closure while the attempt reports [`Outcome::Retryable`] and the
//! policy still has budget, sleeping `base_delay * 2^k` before retry `k + 1`.
//! Both the attempt and the sleep race the caller's cancellation token.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::Method;
use crate::domain::ports::{TransportError, TransportResponse};

mod runtime;

pub use runtime::{NoJitter, ProportionalJitter, RetryRuntime, TokioSleeper};

/// Retry budget and backoff base for one verb class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each later retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Default read policy: 2 retries, 1 s base.
    pub const fn reads() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Default write policy: 3 retries, 1 s base.
    pub const fn writes() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }

    /// Un-jittered delay before retry `retry + 1`.
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(retry))
    }
}

/// Read and write policies selected by method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicies {
    /// Policy for `GET`.
    pub reads: RetryPolicy,
    /// Policy for every other method.
    pub writes: RetryPolicy,
}

impl RetryPolicies {
    /// Policy for `method`.
    pub fn for_method(&self, method: Method) -> RetryPolicy {
        if method.is_read() {
            self.reads
        } else {
            self.writes
        }
    }
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self {
            reads: RetryPolicy::reads(),
            writes: RetryPolicy::writes(),
        }
    }
}

/// Why an attempt did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// A response arrived with a non-2xx status.
    Status(TransportResponse),
    /// No complete response arrived.
    Transport(TransportError),
    /// The caller cancelled the call.
    Cancelled,
}

impl Failure {
    /// HTTP status, when a response arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(response) => Some(response.status),
            Self::Transport(_) | Self::Cancelled => None,
        }
    }

    /// Whether the response was 401 or 403.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(response) => write!(f, "status {}", response.status),
            Self::Transport(error) => write!(f, "{error}"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Result of one attempt or of a whole retried sequence. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// 2xx response.
    Success(TransportResponse),
    /// Failure that another attempt may clear.
    Retryable(Failure),
    /// Failure that ends the sequence.
    Terminal(Failure),
}

/// Sort a raw exchange result into an [`Outcome`].
///
/// 502, 503, and 504 plus retryable transport failures may be retried; every
/// other non-2xx status is terminal.
pub fn assess(result: Result<TransportResponse, TransportError>) -> Outcome {
    match result {
        Ok(response) if response.is_success() => Outcome::Success(response),
        Ok(response) if matches!(response.status, 502..=504) => {
            Outcome::Retryable(Failure::Status(response))
        }
        Ok(response) => Outcome::Terminal(Failure::Status(response)),
        Err(error) if error.is_retryable() => Outcome::Retryable(Failure::Transport(error)),
        Err(error) => Outcome::Terminal(Failure::Transport(error)),
    }
}

/// Async clock-independent sleeping abstraction for backoff.
#[async_trait]
pub trait BackoffSleeper: Send + Sync {
    /// Suspend execution for `duration`.
    ///
    /// ```rust,no_run
    /// use async_trait::async_trait;
    /// use client::domain::BackoffSleeper;
    /// use std::sync::{Arc, Mutex};
    /// use std::time::Duration;
    /// #[derive(Default)]
    /// struct CountingSleeper {
    ///     calls: Arc<Mutex<u32>>,
    /// }
    /// #[async_trait]
    /// impl BackoffSleeper for CountingSleeper {
    ///     async fn sleep(&self, _duration: Duration) {
    ///         *self.calls.lock().expect("calls mutex") += 1;
    ///     }
    /// }
    /// # async fn demo() {
    /// let sleeper = CountingSleeper::default();
    /// sleeper.sleep(Duration::from_millis(25)).await;
    /// assert_eq!(*sleeper.calls.lock().expect("calls mutex"), 1);
    /// # }
    /// ```
    async fn sleep(&self, duration: Duration);
}

/// Backoff jitter abstraction.
pub trait BackoffJitter: Send + Sync {
    /// Adjust the exponential `base` delay computed for retry `retry + 1`.
    ///
    /// ```rust
    /// use client::domain::BackoffJitter;
    /// use std::time::Duration;
    /// struct FixedOffset;
    /// impl BackoffJitter for FixedOffset {
    ///     fn jittered_delay(&self, base: Duration, retry: u32) -> Duration {
    ///         base + Duration::from_millis(u64::from(retry) * 5)
    ///     }
    /// }
    /// let delay = FixedOffset.jittered_delay(Duration::from_millis(100), 2);
    /// assert_eq!(delay, Duration::from_millis(110));
    /// ```
    fn jittered_delay(&self, base: Duration, retry: u32) -> Duration;
}

/// Executes attempts under a [`RetryPolicy`].
#[derive(Clone)]
pub struct RetryEngine {
    sleeper: Arc<dyn BackoffSleeper>,
    jitter: Arc<dyn BackoffJitter>,
}

impl RetryEngine {
    /// Build an engine from injected runtime helpers.
    pub fn new(runtime: RetryRuntime) -> Self {
        Self {
            sleeper: runtime.sleeper,
            jitter: runtime.jitter,
        }
    }

    /// Run `attempt` until it settles, the budget runs out, or `cancel`
    /// fires.
    ///
    /// `attempt` receives the zero-based attempt index. An exhausted
    /// retryable failure is returned as [`Outcome::Terminal`]; cancellation
    /// is returned as `Terminal(Failure::Cancelled)` without waiting for the
    /// in-flight attempt or sleep.
    pub async fn execute<F, Fut>(
        &self,
        policy: RetryPolicy,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> Outcome
    where
        F: FnMut(u32) -> Fut + Send,
        Fut: Future<Output = Outcome> + Send,
    {
        let mut retry = 0_u32;
        loop {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return Outcome::Terminal(Failure::Cancelled),
                outcome = attempt(retry) => outcome,
            };

            match outcome {
                Outcome::Retryable(failure) if retry < policy.max_retries => {
                    let delay = self.jitter.jittered_delay(policy.backoff(retry), retry);
                    debug!(
                        retry = retry + 1,
                        max_retries = policy.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        reason = %failure,
                        "retrying after transient failure"
                    );
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Outcome::Terminal(Failure::Cancelled),
                        () = self.sleeper.sleep(delay) => {}
                    }
                    retry += 1;
                }
                Outcome::Retryable(failure) => return Outcome::Terminal(failure),
                settled => return settled,
            }
        }
    }
}

impl Default for RetryEngine {
    fn default() -> Self {
        Self::new(RetryRuntime::default())
    }
}
