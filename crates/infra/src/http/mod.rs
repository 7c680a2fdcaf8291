//! Outbound HTTP

mod client;

pub use client::{HttpClient, HttpClientBuilder};
