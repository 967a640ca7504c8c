//! Sleepers that never wait.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::BackoffSleeper;

/// Returns immediately without recording anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl BackoffSleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Records every requested delay and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper(Mutex<Vec<Duration>>);

impl RecordingSleeper {
    /// Delays requested so far, oldest first.
    pub fn recorded(&self) -> Vec<Duration> {
        self.lock_entries().clone()
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, Vec<Duration>> {
        match self.0.lock() {
            Ok(entries) => entries,
            Err(_) => panic!("sleeper mutex"),
        }
    }
}

#[async_trait]
impl BackoffSleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.lock_entries().push(duration);
    }
}
