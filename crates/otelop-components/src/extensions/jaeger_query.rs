//! `jaeger_query` extension
//!
//! Serves the Jaeger UI over HTTP and optionally a query API over gRPC.
//! The HTTP port keeps the `jaeger-query` name; gRPC gets the short fixed
//! name `jq-grpc` so it stays inside the 15 character limit.

use k8s_openapi::api::core::v1::ServicePort;
use serde::{Deserialize, Serialize};
use tracing::error;

use otelop_common::{naming, Error, Result};

use crate::builder::Builder;
use crate::component::{construct_service_port, default_endpoint, port_from_endpoint, DEFAULT_REC_ADDRESS, UNSET_PORT};
use crate::parser::{null_as_default, GenericParser};
use crate::single_endpoint::port_or_default;

pub const HTTP_PORT: i32 = 16686;

const GRPC_PORT_NAME: &str = "jq-grpc";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JaegerEndpoint {
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
}

impl JaegerEndpoint {
    fn is_empty(&self) -> bool {
        self.endpoint.is_empty()
    }

    fn port_num(&self) -> Result<i32> {
        if self.endpoint.is_empty() {
            return Err(Error::PortNotFound);
        }
        port_from_endpoint(&self.endpoint)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JaegerQueryConfig {
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "JaegerEndpoint::is_empty")]
    pub http: JaegerEndpoint,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "JaegerEndpoint::is_empty")]
    pub grpc: JaegerEndpoint,
}

pub fn parse_ports(name: &str, default: &ServicePort, cfg: &JaegerQueryConfig) -> Result<Vec<ServicePort>> {
    let http_port = port_or_default(cfg.http.port_num(), default.port)?;
    let grpc_port = port_or_default(cfg.grpc.port_num(), UNSET_PORT)?;

    if http_port == UNSET_PORT && grpc_port == UNSET_PORT {
        error!(component = %name, "couldn't parse the endpoint's port and no default port set");
        return Err(Error::PortNotFound);
    }

    let mut ports = Vec::new();
    if http_port != UNSET_PORT {
        let mut svc = construct_service_port(default, http_port);
        svc.name = Some(naming::port_name(name, http_port));
        ports.push(svc);
    }
    if grpc_port != UNSET_PORT {
        let mut svc = construct_service_port(default, grpc_port);
        svc.name = Some(naming::port_name(GRPC_PORT_NAME, grpc_port));
        ports.push(svc);
    }
    Ok(ports)
}

/// gRPC endpoint that names a port but no host, such as `:16685` or `16685`
fn is_host_less(endpoint: &str) -> bool {
    endpoint.starts_with(':') || (!endpoint.is_empty() && endpoint.bytes().all(|b| b.is_ascii_digit()))
}

/// Default the HTTP endpoint and re-host a host-less gRPC endpoint.
///
/// gRPC has no default port, so any other gRPC endpoint is left as written.
pub fn endpoint_defaulter(addr: &str, port: i32, mut cfg: JaegerQueryConfig) -> Result<JaegerQueryConfig> {
    cfg.http.endpoint = default_endpoint(&cfg.http.endpoint, addr, port);
    if is_host_less(&cfg.grpc.endpoint) {
        cfg.grpc.endpoint = default_endpoint(&cfg.grpc.endpoint, addr, port);
    }
    Ok(cfg)
}

pub fn parser() -> GenericParser<JaegerQueryConfig> {
    Builder::new()
        .with_name("jaeger_query")
        .with_port(HTTP_PORT)
        .with_target_port(HTTP_PORT)
        .with_default_rec_address(DEFAULT_REC_ADDRESS)
        .with_port_parser(parse_ports)
        .with_defaults_applier(endpoint_defaulter)
        .must_build()
}
