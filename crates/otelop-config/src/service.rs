//! The `service` section: pipelines, enabled extensions and self-telemetry

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use otelop_common::{Error, Result};
use otelop_components::parser::null_as_default;

/// Port the collector exposes its own metrics on when nothing else is set
pub const DEFAULT_METRICS_PORT: i32 = 8888;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Service {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,

    /// Kept raw; only the metrics address is ever read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<Value>,

    /// A pipeline written as `traces: ~` decodes to `None`
    #[serde(default, deserialize_with = "null_as_default")]
    pub pipelines: BTreeMap<String, Option<Pipeline>>,
}

/// Component names wired into one pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pipeline {
    #[serde(deserialize_with = "null_as_default")]
    pub receivers: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub processors: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub exporters: Vec<String>,
}

/// The part of `service.telemetry` the operator cares about
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Telemetry {
    #[serde(deserialize_with = "null_as_default")]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub level: String,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub address: String,
}

impl Service {
    /// Typed view of `telemetry`.
    ///
    /// `None` when telemetry is unset or does not fit the expected shape.
    pub fn telemetry(&self) -> Option<Telemetry> {
        let raw = self.telemetry.as_ref()?;
        serde_json::from_value(raw.clone()).ok()
    }

    /// Port of the collector's own metrics endpoint.
    ///
    /// Falls back to [`DEFAULT_METRICS_PORT`] when telemetry is unset or the
    /// address carries no port; a malformed address is an error.
    pub fn metrics_port(&self) -> Result<i32> {
        let Some(telemetry) = self.telemetry() else {
            return Ok(DEFAULT_METRICS_PORT);
        };
        let address = telemetry.metrics.address;
        match split_port(&address)? {
            None => Ok(DEFAULT_METRICS_PORT),
            Some(port) => port
                .parse::<i32>()
                .map_err(|e| Error::config(format!("invalid metrics port {port:?}: {e}"))),
        }
    }
}

/// Port part of a `host:port` address, `None` when there is none
fn split_port(address: &str) -> Result<Option<&str>> {
    if let Some(rest) = address.strip_prefix('[') {
        let (_, after) = rest
            .split_once(']')
            .ok_or_else(|| Error::config(format!("address {address}: missing ']' in address")))?;
        return match after {
            "" => Ok(None),
            _ => after
                .strip_prefix(':')
                .map(Some)
                .ok_or_else(|| Error::config(format!("address {address}: unexpected text after ']'"))),
        };
    }
    match address.matches(':').count() {
        0 => Ok(None),
        1 => Ok(address.split_once(':').map(|(_, port)| port)),
        _ => Err(Error::config(format!("address {address}: too many colons in address"))),
    }
}
