//! ERP material-master integration
//!
//! - [`client`]: REST/JSON gateway client
//! - [`simulated`]: in-memory material master for demos and tests
//! - [`provider`]: picks the client for a connector

pub mod client;
pub mod errors;
pub mod provider;
pub mod simulated;

pub use client::HttpMaterialClient;
pub use errors::{ErpError, ErpErrorCategory};
pub use provider::ConfiguredClientProvider;
pub use simulated::SimulatedMaterialClient;
