//! Runtime helpers used by the retry engine.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::{BackoffJitter, BackoffSleeper};

/// Sleeper and jitter strategy injected into the retry engine.
pub struct RetryRuntime {
    /// Async sleep implementation.
    pub sleeper: Arc<dyn BackoffSleeper>,
    /// Jitter strategy for retry delays.
    pub jitter: Arc<dyn BackoffJitter>,
}

impl Default for RetryRuntime {
    fn default() -> Self {
        Self {
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(NoJitter),
        }
    }
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl BackoffSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Keeps the exact `base * 2^k` schedule.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _retry: u32) -> Duration {
        base
    }
}

/// Adds a random extra of up to `ratio * base` to each delay, spreading the
/// retries of a fleet of clients that failed together.
pub struct ProportionalJitter {
    ratio: f64,
    rng: Mutex<SmallRng>,
}

impl ProportionalJitter {
    /// Jitter seeded from OS entropy. `ratio` is clamped to `[0, 1]`.
    pub fn new(ratio: f64) -> Self {
        Self::with_rng(ratio, SmallRng::from_entropy())
    }

    /// Deterministic jitter for reproducible schedules.
    pub fn seeded(ratio: f64, seed: u64) -> Self {
        Self::with_rng(ratio, SmallRng::seed_from_u64(seed))
    }

    fn with_rng(ratio: f64, rng: SmallRng) -> Self {
        let ratio = if ratio.is_finite() {
            ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            ratio,
            rng: Mutex::new(rng),
        }
    }
}

impl BackoffJitter for ProportionalJitter {
    fn jittered_delay(&self, base: Duration, _retry: u32) -> Duration {
        if self.ratio <= 0.0 {
            return base;
        }
        let Ok(mut rng) = self.rng.lock() else {
            return base;
        };
        let fraction = rng.gen_range(0.0..=self.ratio);
        base.saturating_add(base.mul_f64(fraction))
    }
}
