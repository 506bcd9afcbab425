//! Parser for receivers that expose one port per protocol
//!
//! `otlp`, `jaeger` and friends nest endpoints under `protocols.<name>`. Each
//! protocol has its own default port, and only the protocols present in the
//! configuration produce Service ports.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::{EnvVar, Probe, ServicePort};
use k8s_openapi::api::rbac::v1::PolicyRule;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use otelop_common::{naming, Error, Result};

use crate::builder::Builder;
use crate::component::{component_type, construct_service_port, UNSET_PORT};
use crate::parser::{decode, merge_defaults, null_as_default, Parser};
use crate::single_endpoint::{address_defaulter, SingleEndpointConfig};

/// Minimal shape of a multi-protocol receiver
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiProtocolEndpointConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub protocols: BTreeMap<String, Option<SingleEndpointConfig>>,
}

/// Per-protocol defaults
#[derive(Debug, Clone)]
struct ProtocolDefaults {
    service_port: ServicePort,
    rec_addr: String,
}

/// Receiver with an independent default port for every protocol it speaks
#[derive(Debug, Clone)]
pub struct MultiPortReceiver {
    name: String,
    mappings: BTreeMap<String, ProtocolDefaults>,
}

impl MultiPortReceiver {
    /// Start building a receiver called `name`
    pub fn builder(name: impl Into<String>) -> MultiPortBuilder {
        MultiPortBuilder {
            name: name.into(),
            mappings: Vec::new(),
        }
    }

    /// Protocols this receiver knows, in name order
    pub fn protocols(&self) -> impl Iterator<Item = &str> {
        self.mappings.keys().map(String::as_str)
    }
}

impl Parser for MultiPortReceiver {
    fn parser_type(&self) -> &str {
        component_type(&self.name)
    }

    fn parser_name(&self) -> String {
        format!("__{}", self.name)
    }

    fn get_default_config(&self, config: &Value) -> Result<Value> {
        let mut cfg: MultiProtocolEndpointConfig = decode(config)?;
        if cfg.protocols.is_empty() {
            return Ok(config.clone());
        }
        for (protocol, endpoint) in cfg.protocols.iter_mut() {
            let Some(defaults) = self.mappings.get(protocol) else {
                continue;
            };
            let current = endpoint.take().unwrap_or_default();
            let port = current.port_num_or_default(defaults.service_port.port)?;
            if defaults.rec_addr.is_empty() || port == UNSET_PORT {
                *endpoint = Some(current);
                continue;
            }
            *endpoint = Some(address_defaulter(&defaults.rec_addr, port, current)?);
        }
        Ok(merge_defaults(config, serde_json::to_value(cfg)?))
    }

    fn ports(&self, name: &str, config: &Value) -> Result<Vec<ServicePort>> {
        let cfg: MultiProtocolEndpointConfig = decode(config)?;
        let mut ports = Vec::with_capacity(cfg.protocols.len());
        for (protocol, endpoint) in &cfg.protocols {
            let Some(defaults) = self.mappings.get(protocol) else {
                return Err(Error::unknown_protocol(protocol));
            };
            let default = &defaults.service_port;
            let port = match endpoint {
                Some(ec) => ec.port_num_or_default(default.port)?,
                None => default.port,
            };
            let mut svc = construct_service_port(default, port);
            svc.name = Some(naming::port_name(&format!("{name}-{protocol}"), port));
            ports.push(svc);
        }
        Ok(ports)
    }

    fn get_rbac_rules(&self, _config: &Value) -> Result<Vec<PolicyRule>> {
        Ok(Vec::new())
    }

    fn liveness_probe(&self, _config: &Value) -> Result<Option<Probe>> {
        Ok(None)
    }

    fn readiness_probe(&self, _config: &Value) -> Result<Option<Probe>> {
        Ok(None)
    }

    fn startup_probe(&self, _config: &Value) -> Result<Option<Probe>> {
        Ok(None)
    }

    fn environment_variables(&self, _config: &Value) -> Result<Vec<EnvVar>> {
        Ok(Vec::new())
    }
}

/// Builder for a [`MultiPortReceiver`]; each mapping is a named port builder
pub struct MultiPortBuilder {
    name: String,
    mappings: Vec<Builder<SingleEndpointConfig>>,
}

impl MultiPortBuilder {
    /// Add a protocol, usually from [`protocol`]
    pub fn add_port_mapping(mut self, mapping: Builder<SingleEndpointConfig>) -> Self {
        self.mappings.push(mapping);
        self
    }

    pub fn build(self) -> Result<MultiPortReceiver> {
        if self.name.is_empty() {
            return Err(Error::invalid_settings("no name specified"));
        }
        if self.mappings.is_empty() {
            return Err(Error::invalid_settings("must provide at least one port mapping"));
        }
        let mut mappings = BTreeMap::new();
        for mapping in self.mappings {
            let built = mapping.build()?;
            let settings = built.settings();
            mappings.insert(
                settings.name().to_string(),
                ProtocolDefaults {
                    service_port: settings.service_port(),
                    rec_addr: settings.default_rec_addr().to_string(),
                },
            );
        }
        Ok(MultiPortReceiver {
            name: self.name,
            mappings,
        })
    }

    /// # Panics
    ///
    /// Panics when [`MultiPortBuilder::build`] fails.
    pub fn must_build(self) -> MultiPortReceiver {
        match self.build() {
            Ok(receiver) => receiver,
            Err(e) => panic!("{e}"),
        }
    }
}

/// Port builder for one protocol of a multi-protocol receiver
pub fn protocol(name: &str, port: i32) -> Builder<SingleEndpointConfig> {
    Builder::new().with_name(name).with_port(port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{DEFAULT_REC_ADDRESS, GRPC, HTTP, TCP, UDP};
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
    use rstest::rstest;
    use serde_json::json;

    fn otlp() -> MultiPortReceiver {
        MultiPortReceiver::builder("otlp")
            .add_port_mapping(
                protocol(GRPC, 4317)
                    .with_target_port(4317)
                    .with_app_protocol(GRPC)
                    .with_default_rec_address(DEFAULT_REC_ADDRESS),
            )
            .add_port_mapping(
                protocol(HTTP, 4318)
                    .with_target_port(4318)
                    .with_app_protocol(HTTP)
                    .with_default_rec_address(DEFAULT_REC_ADDRESS),
            )
            .must_build()
    }

    #[test]
    fn only_configured_protocols_get_ports() {
        let ports = otlp().ports("otlp", &json!({"protocols": {"grpc": {}}})).unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].name.as_deref(), Some("otlp-grpc"));
        assert_eq!(ports[0].port, 4317);
        assert_eq!(ports[0].target_port, Some(IntOrString::Int(4317)));
        assert_eq!(ports[0].app_protocol.as_deref(), Some(GRPC));
    }

    #[rstest]
    #[case::null_protocol(json!({"protocols": {"http": null}}), "otlp-http", 4318)]
    #[case::custom_port(json!({"protocols": {"http": {"endpoint": "0.0.0.0:1234"}}}), "otlp-http", 1234)]
    #[case::no_port(json!({"protocols": {"grpc": {"endpoint": "0.0.0.0"}}}), "otlp-grpc", 4317)]
    fn single_protocol_ports(#[case] config: Value, #[case] name: &str, #[case] port: i32) {
        let ports = otlp().ports("otlp", &config).unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].name.as_deref(), Some(name));
        assert_eq!(ports[0].port, port);
        assert_eq!(ports[0].target_port, Some(IntOrString::Int(port)));
    }

    #[test]
    fn both_protocols_and_instance_names() {
        let ports = otlp()
            .ports(
                "otlp/test",
                &json!({"protocols": {"grpc": {"endpoint": ":5555"}, "http": {}}}),
            )
            .unwrap();
        let names: Vec<_> = ports.iter().map(|p| p.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["otlp-test-grpc", "otlp-test-http"]);
        assert_eq!(ports[0].port, 5555);
        assert_eq!(ports[1].port, 4318);
    }

    #[test]
    fn long_names_fall_back_to_port_numbers() {
        let ports = otlp()
            .ports("otlp/a-very-long-name", &json!({"protocols": {"grpc": {}}}))
            .unwrap();
        assert_eq!(ports[0].name.as_deref(), Some("port-4317"));
    }

    #[test]
    fn unknown_protocol_fails_the_call() {
        let err = otlp()
            .ports("otlp", &json!({"protocols": {"grpc": {}, "thrift": {}}}))
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown protocol set: thrift");
    }

    #[test]
    fn missing_protocols_yield_no_ports() {
        assert!(otlp().ports("otlp", &json!({})).unwrap().is_empty());
        assert!(otlp().ports("otlp", &Value::Null).unwrap().is_empty());
    }

    #[test]
    fn non_map_config_is_a_shape_error() {
        assert_eq!(
            otlp().ports("otlp", &json!([1])).unwrap_err(),
            Error::shape("array")
        );
    }

    #[test]
    fn transport_protocols_are_kept_per_mapping() {
        let jaeger = MultiPortReceiver::builder("jaeger")
            .add_port_mapping(protocol(GRPC, 14250).with_protocol(TCP))
            .add_port_mapping(protocol("thrift_compact", 6831).with_protocol(UDP))
            .must_build();
        let ports = jaeger
            .ports("jaeger", &json!({"protocols": {"grpc": null, "thrift_compact": null}}))
            .unwrap();
        assert_eq!(ports[0].protocol.as_deref(), Some(TCP));
        assert_eq!(ports[1].protocol.as_deref(), Some(UDP));
        assert_eq!(ports[1].name.as_deref(), Some("port-6831"));
        assert_eq!(ports[1].target_port, None);
    }

    /// Story: defaulting fills only the protocols the user listed
    #[test]
    fn story_defaults_only_listed_protocols() {
        let raw = json!({"protocols": {"grpc": null, "http": {"endpoint": ":9999", "cors": {"allowed_origins": ["*"]}}}});
        let defaulted = otlp().get_default_config(&raw).unwrap();
        assert_eq!(
            defaulted,
            json!({"protocols": {
                "grpc": {"endpoint": "0.0.0.0:4317"},
                "http": {"endpoint": "0.0.0.0:9999", "cors": {"allowed_origins": ["*"]}}
            }})
        );

        let only_http = otlp()
            .get_default_config(&json!({"protocols": {"http": {}}}))
            .unwrap();
        assert_eq!(only_http, json!({"protocols": {"http": {"endpoint": "0.0.0.0:4318"}}}));
    }

    #[test]
    fn default_config_without_protocols_is_unchanged() {
        assert_eq!(otlp().get_default_config(&Value::Null).unwrap(), Value::Null);
        assert_eq!(otlp().get_default_config(&json!({})).unwrap(), json!({}));
    }

    #[test]
    fn build_validation() {
        assert!(MultiPortReceiver::builder("").add_port_mapping(protocol(GRPC, 1)).build().is_err());
        assert!(MultiPortReceiver::builder("x").build().is_err());
        let err = MultiPortReceiver::builder("x")
            .add_port_mapping(protocol("", 1))
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid settings struct, no name specified");
    }

    #[test]
    fn parser_identity() {
        let receiver = otlp();
        assert_eq!(receiver.parser_type(), "otlp");
        assert_eq!(receiver.parser_name(), "__otlp");
        assert_eq!(receiver.protocols().collect::<Vec<_>>(), vec!["grpc", "http"]);
    }
}
