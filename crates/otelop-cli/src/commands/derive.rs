//! Read-only derivations: ports, probes and env vars

use std::io::Write;

use k8s_openapi::api::core::v1::{Probe, ServicePort};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use serde::Serialize;
use tracing::info;

use otelop_components::ComponentRegistry;
use otelop_config::CollectorConfig;

use super::write_yaml;

#[derive(Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
struct Probes {
    #[serde(skip_serializing_if = "Option::is_none")]
    liveness_probe: Option<Probe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    readiness_probe: Option<Probe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    startup_probe: Option<Probe>,
}

/// Name of the port the collector serves its own telemetry on
const METRICS_PORT_NAME: &str = "metrics";

/// Component ports followed by the collector's own metrics port.
///
/// A component port already named `metrics` wins.
pub fn ports(config: &CollectorConfig, out: &mut impl Write) -> anyhow::Result<()> {
    let mut ports = config.all_ports(&ComponentRegistry::builtin());
    let metrics_port = config.service.metrics_port()?;
    if ports.iter().all(|p| p.name.as_deref() != Some(METRICS_PORT_NAME)) {
        ports.push(ServicePort {
            name: Some(METRICS_PORT_NAME.to_string()),
            port: metrics_port,
            protocol: Some("TCP".to_string()),
            target_port: Some(IntOrString::Int(metrics_port)),
            ..Default::default()
        });
    }
    info!(count = ports.len(), metrics_port, "derived service ports");
    write_yaml(out, &ports)
}

pub fn probes(config: &CollectorConfig, out: &mut impl Write) -> anyhow::Result<()> {
    let registry = ComponentRegistry::builtin();
    let probes = Probes {
        liveness_probe: config.liveness_probe(&registry),
        readiness_probe: config.readiness_probe(&registry),
        startup_probe: config.startup_probe(&registry),
    };
    write_yaml(out, &probes)
}

pub fn env(config: &CollectorConfig, out: &mut impl Write) -> anyhow::Result<()> {
    write_yaml(out, &config.environment_variables(&ComponentRegistry::builtin()))
}
