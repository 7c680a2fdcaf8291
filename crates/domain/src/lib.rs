//! # MatSync Domain
//!
//! Business domain types for the product/material-master synchronization
//! engine.
//!
//! This crate contains:
//! - Canonical product records and ERP material records
//! - Connector configuration and field mapping rules
//! - Sync run results, logs and statistics
//! - Connector health classification
//! - Configuration structures
//! - Domain error types and Result definitions
//!
//! ## Architecture
//! - No dependencies on other MatSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
