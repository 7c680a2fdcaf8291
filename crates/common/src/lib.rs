//! Modular common utilities shared across MatSync crates.
//!
//! # Feature Tiers
//!
//! - `foundation`: backoff strategies and clocks
//! - `runtime`: async sleep abstraction backed by tokio (default)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

#[cfg(feature = "foundation")]
pub mod resilience;
#[cfg(feature = "runtime")]
pub mod time;

#[cfg(feature = "foundation")]
pub use resilience::BackoffStrategy;
#[cfg(feature = "runtime")]
pub use time::{Clock, MockClock, RecordingSleeper, Sleeper, SystemClock, TokioSleeper};
