//! Collector configuration documents
//!
//! [`CollectorConfig`] is a decoded collector YAML file. Component bodies stay
//! raw so any parser can read them; the `service` section is typed because
//! it decides which components are enabled. The aggregation methods walk the
//! enabled components, ask the registry for each one's parser and collect
//! the results into the values a collector Deployment needs.

mod aggregate;
pub mod config;
pub mod service;

pub use config::{CollectorConfig, EnabledComponents};
pub use service::{MetricsConfig, Pipeline, Service, Telemetry, DEFAULT_METRICS_PORT};

pub use otelop_common::{Error, Result};
