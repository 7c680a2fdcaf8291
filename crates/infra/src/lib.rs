//! # MatSync Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - SQLite repositories (r2d2 pool) for connectors, products, provisioning,
//!   sync logs and connector health
//! - The ERP material-master clients (HTTP and simulated) and the
//!   per-connector client provider
//! - Configuration loading
//! - Background schedulers (health sweeps, cron-triggered syncs)
//!
//! ## Architecture
//! - Implements traits defined in `matsync-core`
//! - Contains all "impure" code (I/O, network, timers)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod scheduling;

pub use database::*;
pub use errors::InfraError;
pub use integrations::erp::{
    ConfiguredClientProvider, ErpError, ErpErrorCategory, HttpMaterialClient,
    SimulatedMaterialClient,
};
