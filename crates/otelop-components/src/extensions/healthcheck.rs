//! `health_check` and `healthcheckv2` extensions
//!
//! Both expose an HTTP endpoint the collector's liveness and readiness
//! probes point at. v1 configures it at the top level; v2 nests it under
//! `http` and serves status on a different default path.

use k8s_openapi::api::core::v1::{HTTPGetAction, Probe, ServicePort};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde::{Deserialize, Serialize};

use otelop_common::Result;

use crate::builder::Builder;
use crate::component::{default_endpoint, DEFAULT_REC_ADDRESS};
use crate::parser::{null_as_default, GenericParser};
use crate::single_endpoint::{address_defaulter, parse_single_endpoint_silent, SingleEndpointConfig};

/// Default port of both health check extensions
pub const DEFAULT_HEALTHCHECK_PORT: i32 = 13133;

/// Default probe path of `health_check`
pub const DEFAULT_V1_PATH: &str = "/";

/// Default probe path of `healthcheckv2`
pub const DEFAULT_V2_PATH: &str = "/health/status";

fn http_probe(path: &str, port: i32) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(path.to_string()),
            port: IntOrString::Int(port),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthcheckV1Config {
    #[serde(flatten)]
    pub endpoint: SingleEndpointConfig,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub path: String,
}

fn v1_ports(name: &str, default: &ServicePort, cfg: &HealthcheckV1Config) -> Result<Vec<ServicePort>> {
    parse_single_endpoint_silent(name, default, &cfg.endpoint)
}

pub fn v1_probe(cfg: &HealthcheckV1Config) -> Result<Option<Probe>> {
    let port = cfg.endpoint.port_num_or_default(DEFAULT_HEALTHCHECK_PORT)?;
    let path = if cfg.path.is_empty() { DEFAULT_V1_PATH } else { &cfg.path };
    Ok(Some(http_probe(path, port)))
}

fn v1_defaults(addr: &str, port: i32, mut cfg: HealthcheckV1Config) -> Result<HealthcheckV1Config> {
    cfg.endpoint = address_defaulter(addr, port, cfg.endpoint)?;
    Ok(cfg)
}

pub fn v1_parser() -> GenericParser<HealthcheckV1Config> {
    Builder::new()
        .with_name("health_check")
        .with_port(DEFAULT_HEALTHCHECK_PORT)
        .with_target_port(DEFAULT_HEALTHCHECK_PORT)
        .with_default_rec_address(DEFAULT_REC_ADDRESS)
        .with_port_parser(v1_ports)
        .with_liveness_gen(v1_probe)
        .with_readiness_gen(v1_probe)
        .with_defaults_applier(v1_defaults)
        .must_build()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthcheckV2Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpConfig>,
}

impl HealthcheckV2Config {
    fn http_endpoint(&self) -> SingleEndpointConfig {
        SingleEndpointConfig {
            endpoint: self.http.as_ref().map(|h| h.endpoint.clone()).unwrap_or_default(),
            ..Default::default()
        }
    }

    fn status_path(&self) -> &str {
        self.http
            .as_ref()
            .and_then(|h| h.status.as_ref())
            .map(|s| s.path.as_str())
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_V2_PATH)
    }
}

fn v2_ports(name: &str, default: &ServicePort, cfg: &HealthcheckV2Config) -> Result<Vec<ServicePort>> {
    parse_single_endpoint_silent(name, default, &cfg.http_endpoint())
}

pub fn v2_probe(cfg: &HealthcheckV2Config) -> Result<Option<Probe>> {
    let port = cfg.http_endpoint().port_num_or_default(DEFAULT_HEALTHCHECK_PORT)?;
    Ok(Some(http_probe(cfg.status_path(), port)))
}

fn v2_defaults(addr: &str, port: i32, mut cfg: HealthcheckV2Config) -> Result<HealthcheckV2Config> {
    if let Some(http) = cfg.http.as_mut() {
        http.endpoint = default_endpoint(&http.endpoint, addr, port);
    }
    Ok(cfg)
}

pub fn v2_parser() -> GenericParser<HealthcheckV2Config> {
    Builder::new()
        .with_name("healthcheckv2")
        .with_port(DEFAULT_HEALTHCHECK_PORT)
        .with_target_port(DEFAULT_HEALTHCHECK_PORT)
        .with_default_rec_address(DEFAULT_REC_ADDRESS)
        .with_port_parser(v2_ports)
        .with_liveness_gen(v2_probe)
        .with_readiness_gen(v2_probe)
        .with_defaults_applier(v2_defaults)
        .must_build()
}
