//! # MatSync Server
//!
//! HTTP management surface and application wiring.
//!
//! This crate contains:
//! - axum handlers for sync triggers, run history and connector health
//! - Application context (dependency injection)
//! - Main entry point and setup
//!
//! ## Architecture
//! - Depends on `domain`, `core` and `infra`
//! - Wires up the hexagonal architecture

pub mod commands;
pub mod context;
pub mod error;
pub mod router;
pub mod utils;

pub use context::AppContext;
pub use error::{ApiError, ApiResult};
pub use router::build_router;
