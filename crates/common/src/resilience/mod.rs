//! Resilience primitives
//!
//! Retry loops live next to the code that owns them (the health monitor, the
//! HTTP client); this module only provides the delay schedules they share.

pub mod backoff;

pub use backoff::BackoffStrategy;
