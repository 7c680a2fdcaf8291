//! Async sleep abstraction
//!
//! Retry loops sleep through [`Sleeper`]; production uses [`TokioSleeper`],
//! tests use [`RecordingSleeper`] to assert the backoff schedule instantly.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::clock::MockClock;

/// Async sleep, injectable so retry loops can run on a mock clock.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Records requested delays and returns immediately.
///
/// When built with [`RecordingSleeper::advancing`], each sleep also advances
/// the given mock clock, keeping simulated time consistent.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
    clock: Option<MockClock>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advancing(clock: MockClock) -> Self {
        Self { delays: Arc::default(), clock: Some(clock) }
    }

    /// Delays requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().push(duration);
        if let Some(clock) = &self.clock {
            clock.advance(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Clock;

    #[tokio::test]
    async fn recording_sleeper_returns_immediately() {
        let clock = MockClock::new();
        let sleeper = RecordingSleeper::advancing(clock.clone());
        let start = clock.now();

        sleeper.sleep(Duration::from_secs(1)).await;
        sleeper.sleep(Duration::from_secs(2)).await;

        assert_eq!(sleeper.delays(), vec![Duration::from_secs(1), Duration::from_secs(2)]);
        assert_eq!(clock.now().duration_since(start), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn tokio_sleeper_skips_zero_delay() {
        TokioSleeper.sleep(Duration::ZERO).await;
    }
}
