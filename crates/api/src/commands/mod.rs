//! HTTP handlers for the management surface

mod connectors;
mod health;
mod sync;

pub use connectors::*;
pub use health::*;
pub use sync::*;
