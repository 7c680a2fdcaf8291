//! Conflict detection and last-write-wins resolution

mod resolver;

pub use resolver::ConflictResolver;
