//! Parsers for components that listen on a single `endpoint`

use k8s_openapi::api::core::v1::ServicePort;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use otelop_common::{naming, Error, Result};

use crate::builder::Builder;
use crate::component::{construct_service_port, default_endpoint, port_from_endpoint, UNSET_PORT};
use crate::parser::null_as_default;

/// Minimal shape of a component with either `endpoint` or `listen_address`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingleEndpointConfig {
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub endpoint: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub listen_address: String,
}

impl SingleEndpointConfig {
    /// Port from `endpoint`, or from `listen_address` when no endpoint is set
    pub fn port_num(&self) -> Result<i32> {
        if !self.endpoint.is_empty() {
            port_from_endpoint(&self.endpoint)
        } else if !self.listen_address.is_empty() {
            port_from_endpoint(&self.listen_address)
        } else {
            Err(Error::PortNotFound)
        }
    }

    /// Configured port, falling back to `default` when none is set.
    ///
    /// Overflowing ports are still an error.
    pub fn port_num_or_default(&self, default: i32) -> Result<i32> {
        port_or_default(self.port_num(), default)
    }
}

/// Fall back to `default` on [`Error::PortNotFound`], propagate anything else
pub(crate) fn port_or_default(found: Result<i32>, default: i32) -> Result<i32> {
    match found {
        Ok(port) => Ok(port),
        Err(Error::PortNotFound) => {
            debug!(default, "no port set, using default");
            Ok(default)
        }
        Err(e) => Err(e),
    }
}

fn resolve(name: &str, default: &ServicePort, cfg: &SingleEndpointConfig, silent: bool) -> Result<Vec<ServicePort>> {
    let found = cfg.port_num();
    if default.port == UNSET_PORT {
        if let Err(e) = &found {
            if e.is_port_not_found() {
                if silent {
                    debug!(component = %name, "no port set and no default, skipping");
                    return Ok(Vec::new());
                }
                error!(component = %name, error = %e, "couldn't parse the endpoint's port and no default port set");
            }
            return Err(e.clone());
        }
    }
    let port = port_or_default(found, default.port)?;
    let mut svc = construct_service_port(default, port);
    svc.name = Some(naming::port_name(name, port));
    Ok(vec![svc])
}

/// Port parser that fails when neither config nor default provide a port
pub fn parse_single_endpoint(name: &str, default: &ServicePort, cfg: &SingleEndpointConfig) -> Result<Vec<ServicePort>> {
    resolve(name, default, cfg, false)
}

/// Port parser that returns no ports when neither config nor default provide one
pub fn parse_single_endpoint_silent(
    name: &str,
    default: &ServicePort,
    cfg: &SingleEndpointConfig,
) -> Result<Vec<ServicePort>> {
    resolve(name, default, cfg, true)
}

/// Fill in a missing or host-less `endpoint`.
///
/// Configs that only set `listen_address` are left alone.
pub fn address_defaulter(addr: &str, port: i32, mut cfg: SingleEndpointConfig) -> Result<SingleEndpointConfig> {
    if cfg.endpoint.is_empty() && !cfg.listen_address.is_empty() {
        return Ok(cfg);
    }
    cfg.endpoint = default_endpoint(&cfg.endpoint, addr, port);
    Ok(cfg)
}

/// Builder for a strict single-endpoint parser
pub fn new_single_endpoint_parser(name: &str, port: i32) -> Builder<SingleEndpointConfig> {
    Builder::new()
        .with_name(name)
        .with_port(port)
        .with_port_parser(parse_single_endpoint)
        .with_defaults_applier(address_defaulter)
}

/// Builder for a silent single-endpoint parser
pub fn new_silent_single_endpoint_parser(name: &str, port: i32) -> Builder<SingleEndpointConfig> {
    Builder::new()
        .with_name(name)
        .with_port(port)
        .with_port_parser(parse_single_endpoint_silent)
        .with_defaults_applier(address_defaulter)
}
