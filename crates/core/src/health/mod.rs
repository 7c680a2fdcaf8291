//! Connector health monitoring

mod monitor;
pub mod ports;
mod recommendation;

pub use monitor::{ConnectionHealthMonitor, HealthMonitorConfig};
pub use recommendation::{persistent_failure_recommendation, recommendation_for_error};
