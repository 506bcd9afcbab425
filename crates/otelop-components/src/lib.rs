//! Collector component parsers
//!
//! Every receiver, processor, exporter and extension in a collector
//! configuration is keyed by a name such as `otlp` or `otlp/internal`. The
//! part before the slash selects a [`Parser`] from a [`Registry`], and the
//! parser turns the component's raw configuration into the Kubernetes values
//! the collector needs: Service ports, RBAC rules, probes and env vars.
//!
//! Most parsers are [`GenericParser`]s assembled with a [`Builder`] from a
//! typed configuration shape and a handful of plain functions. Components
//! that multiplex several protocols use [`MultiPortReceiver`].

pub mod builder;
pub mod component;
pub mod exporters;
pub mod extensions;
pub mod multi_endpoint;
pub mod parser;
pub mod processors;
pub mod rbac;
pub mod receivers;
pub mod registry;
pub mod single_endpoint;

pub use builder::{Builder, Settings};
pub use component::{component_type, port_from_endpoint};
pub use multi_endpoint::{MultiPortBuilder, MultiPortReceiver, MultiProtocolEndpointConfig};
pub use parser::{CollectorContext, ComponentConfig, GenericParser, Nop, Parser};
pub use registry::{ComponentKind, ComponentRegistry, Registry};
pub use single_endpoint::SingleEndpointConfig;

pub use otelop_common::{Error, Result};
