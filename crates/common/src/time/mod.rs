//! Time abstractions
//!
//! - **[`clock`]**: real and mock clocks (monotonic + wall clock)
//! - **[`sleep`]**: async sleep behind a trait so retry schedules can be
//!   tested without real delays

pub mod clock;
pub mod sleep;

pub use clock::{Clock, MockClock, SystemClock};
pub use sleep::{RecordingSleeper, Sleeper, TokioSleeper};
