//! Port-string utilities and Service port construction

use std::sync::LazyLock;

use k8s_openapi::api::core::v1::{EnvVar, EnvVarSource, ObjectFieldSelector, ServicePort};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use regex::Regex;

use otelop_common::{Error, Result};

/// Port value meaning "no default port"
pub const UNSET_PORT: i32 = 0;

/// Address receivers listen on unless told otherwise
pub const DEFAULT_REC_ADDRESS: &str = "0.0.0.0";

/// Application protocol name for gRPC ports
pub const GRPC: &str = "grpc";

/// Application protocol name for HTTP ports
pub const HTTP: &str = "http";

/// TCP transport protocol
pub const TCP: &str = "TCP";

/// UDP transport protocol
pub const UDP: &str = "UDP";

static PORT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(":[0-9]+").expect("port pattern is valid"));

/// Component type of a component name: everything before the first `/`.
///
/// `otlp/internal` and `otlp` both have type `otlp`.
pub fn component_type(name: &str) -> &str {
    match name.find('/') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// Extract the port from a `host:port` string.
///
/// The first `:<digits>` group wins. A missing group or a port of zero is
/// [`Error::PortNotFound`]; digits that do not fit in an `i32` are an
/// overflow error.
pub fn port_from_endpoint(endpoint: &str) -> Result<i32> {
    let Some(found) = PORT_PATTERN.find(endpoint) else {
        return Err(Error::PortNotFound);
    };
    let digits = &found.as_str()[1..];
    let port: i32 = digits
        .parse()
        .map_err(|_| Error::port_overflow(digits))?;
    if port == UNSET_PORT {
        return Err(Error::PortNotFound);
    }
    Ok(port)
}

/// Target port as an integer, zero when unset or named
pub(crate) fn int_target_port(port: &ServicePort) -> i32 {
    match port.target_port {
        Some(IntOrString::Int(p)) => p,
        _ => UNSET_PORT,
    }
}

/// Build the Service port returned to callers from a component's default.
///
/// The result is always a fresh copy; `current` is never modified. The
/// target port follows the resolved port when both it and the default
/// target are set.
pub fn construct_service_port(current: &ServicePort, port: i32) -> ServicePort {
    let target_port = if port > 0 && int_target_port(current) > 0 {
        Some(IntOrString::Int(port))
    } else {
        current.target_port.clone()
    };
    ServicePort {
        name: current.name.clone(),
        port,
        target_port,
        node_port: current.node_port,
        app_protocol: current.app_protocol.clone(),
        protocol: current.protocol.clone(),
        ..Default::default()
    }
}

/// Env var populated from a field of the collector's own pod
pub fn env_from_field(name: &str, field_path: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value_from: Some(EnvVarSource {
            field_ref: Some(ObjectFieldSelector {
                field_path: field_path.to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Fill in a missing or host-less endpoint with `addr`.
///
/// An empty endpoint becomes `addr:port` and `:4317` or `4317` becomes
/// `addr:4317`. A bare host gets the default port appended. Anything with
/// both a host and a port is returned unchanged.
pub(crate) fn default_endpoint(endpoint: &str, addr: &str, port: i32) -> String {
    if endpoint.is_empty() {
        return format!("{addr}:{port}");
    }
    match endpoint.split_once(':') {
        Some(("", _)) => {
            let port_part = endpoint.rsplit(':').next().unwrap_or_default();
            format!("{addr}:{port_part}")
        }
        Some(_) => endpoint.to_string(),
        None if endpoint.bytes().all(|b| b.is_ascii_digit()) => format!("{addr}:{endpoint}"),
        None => format!("{endpoint}:{port}"),
    }
}
