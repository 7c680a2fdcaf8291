//! Backoff strategies for retry delays

use std::time::Duration;

/// Backoff strategy for calculating retry delays.
///
/// `attempt` is 1-based: the delay waited after the first failed attempt is
/// `calculate_delay(1)`.
#[derive(Debug, Clone, PartialEq)]
pub enum BackoffStrategy {
    /// Fixed delay between retries
    Fixed(Duration),
    /// Linear backoff: `initial_delay + attempt * increment`
    Linear { initial_delay: Duration, increment: Duration },
    /// Exponential backoff: `initial_delay * base^(attempt - 1)`, capped
    Exponential { initial_delay: Duration, base: f64, max_delay: Duration },
}

impl BackoffStrategy {
    /// `step * attempt`, the schedule used by connection health retries.
    pub fn linear(step: Duration) -> Self {
        Self::Linear { initial_delay: Duration::ZERO, increment: step }
    }

    /// Calculate the delay to wait after failed attempt number `attempt`.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        match self {
            BackoffStrategy::Fixed(delay) => *delay,
            BackoffStrategy::Linear { initial_delay, increment } => {
                initial_delay.saturating_add(increment.saturating_mul(attempt))
            }
            BackoffStrategy::Exponential { initial_delay, base, max_delay } => {
                let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
                let delay = initial_delay.as_millis() as f64 * base.powi(exponent);
                let delay_ms = delay.min(max_delay.as_millis() as f64) as u64;
                Duration::from_millis(delay_ms)
            }
        }
    }
}
