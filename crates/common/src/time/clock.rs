//! Clock abstraction for testability
//!
//! Latency measurement and run timestamps go through [`Clock`] so tests can
//! simulate a slow probe or a specific wall-clock time without waiting.
//!
//! ```
//! use std::time::Duration;
//!
//! use matsync_common::time::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.now();
//! clock.advance(Duration::from_millis(6000));
//! assert_eq!(clock.now().duration_since(start), Duration::from_millis(6000));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Source of monotonic and wall-clock time.
pub trait Clock: Send + Sync {
    /// Monotonic timestamp suitable for measuring durations.
    fn now(&self) -> Instant;

    /// Current wall-clock time.
    fn system_time(&self) -> SystemTime;

    /// Current wall-clock time as a UTC timestamp.
    fn utc_now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.system_time())
    }
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn system_time(&self) -> SystemTime {
        (**self).system_time()
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Clones share the same elapsed time, so a test can hand one clone to the
/// code under test and advance another.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    base_system_time: SystemTime,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Mock clock whose wall clock starts at the current real time.
    pub fn new() -> Self {
        Self::starting_at(SystemTime::now())
    }

    /// Mock clock whose wall clock starts at `base`.
    pub fn starting_at(base: impl Into<SystemTime>) -> Self {
        Self {
            start: Instant::now(),
            base_system_time: base.into(),
            elapsed: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Simulate time passing.
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Total simulated time since creation.
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + *self.elapsed.lock()
    }

    fn system_time(&self) -> SystemTime {
        self.base_system_time + *self.elapsed.lock()
    }
}
