//! Shared types for the collector component parsers
//!
//! This crate holds everything the parser, config and target allocator crates
//! have in common: the error type, Kubernetes-safe naming helpers, YAML
//! loading into `serde_json::Value`, and logging initialisation for binaries.

pub mod error;
pub mod naming;
pub mod telemetry;
pub mod yaml;

pub use error::Error;

/// Result type alias using the shared error type
pub type Result<T> = std::result::Result<T, Error>;
