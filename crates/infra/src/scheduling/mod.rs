//! Background tasks
//!
//! - Health monitor service: interval sweep over every ERP connector
//! - Sync scheduler: cron-triggered sync runs per connector
//!
//! Both own their spawned tasks through join handles, stop through
//! cancellation tokens and wrap every lifecycle step in a timeout.

pub mod error;
pub mod health_monitor_service;
pub mod sync_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use health_monitor_service::{
    HealthMonitorService, HealthMonitorServiceConfig, HealthStatusListener, LoggingHealthListener,
};
pub use sync_scheduler::{run_scheduled_sync, SyncScheduler, SyncSchedulerConfig};
