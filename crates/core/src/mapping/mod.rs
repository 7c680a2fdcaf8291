//! Field mapping between ERP materials and canonical products

pub mod defaults;
mod error;
mod mapper;

pub use defaults::{DefaultMapping, ValueEncoding, DEFAULT_MAPPINGS};
pub use error::MappingError;
pub use mapper::{FieldMapper, MappedProduct};
