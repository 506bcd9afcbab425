//! The decoded collector configuration document

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use otelop_common::yaml::{parse_yaml, to_yaml};
use otelop_common::Result;
use otelop_components::parser::{decode, null_as_default};
use otelop_components::ComponentKind;

use crate::service::Service;

/// A collector configuration file.
///
/// Component sections map component names to their raw bodies in document
/// order. Unknown top-level keys are dropped on decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub receivers: Map<String, Value>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub exporters: Map<String, Value>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Map::is_empty")]
    pub processors: Map<String, Value>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Map::is_empty")]
    pub connectors: Map<String, Value>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Map::is_empty")]
    pub extensions: Map<String, Value>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub service: Service,
}

/// Names of the components a collector actually runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnabledComponents {
    pub receivers: BTreeSet<String>,
    pub processors: BTreeSet<String>,
    pub exporters: BTreeSet<String>,
    pub extensions: BTreeSet<String>,
}

impl EnabledComponents {
    pub fn get(&self, kind: ComponentKind) -> &BTreeSet<String> {
        match kind {
            ComponentKind::Receiver => &self.receivers,
            ComponentKind::Processor => &self.processors,
            ComponentKind::Exporter => &self.exporters,
            ComponentKind::Extension => &self.extensions,
        }
    }

    pub fn contains(&self, kind: ComponentKind, name: &str) -> bool {
        self.get(kind).contains(name)
    }
}

impl CollectorConfig {
    /// Decode a collector YAML document. Empty input is an empty config.
    pub fn from_yaml(input: &str) -> Result<Self> {
        Self::from_value(&parse_yaml(input)?)
    }

    /// Decode an already parsed document
    pub fn from_value(value: &Value) -> Result<Self> {
        decode(value)
    }

    pub fn to_yaml(&self) -> Result<String> {
        to_yaml(self)
    }

    /// Component section for `kind`
    pub fn section(&self, kind: ComponentKind) -> &Map<String, Value> {
        match kind {
            ComponentKind::Receiver => &self.receivers,
            ComponentKind::Processor => &self.processors,
            ComponentKind::Exporter => &self.exporters,
            ComponentKind::Extension => &self.extensions,
        }
    }

    pub(crate) fn section_mut(&mut self, kind: ComponentKind) -> &mut Map<String, Value> {
        match kind {
            ComponentKind::Receiver => &mut self.receivers,
            ComponentKind::Processor => &mut self.processors,
            ComponentKind::Exporter => &mut self.exporters,
            ComponentKind::Extension => &mut self.extensions,
        }
    }

    /// Components referenced by a pipeline, plus extensions listed in `service.extensions`
    pub fn enabled_components(&self) -> EnabledComponents {
        let mut enabled = EnabledComponents::default();
        for pipeline in self.service.pipelines.values().flatten() {
            enabled.receivers.extend(pipeline.receivers.iter().cloned());
            enabled.processors.extend(pipeline.processors.iter().cloned());
            enabled.exporters.extend(pipeline.exporters.iter().cloned());
        }
        if let Some(extensions) = &self.service.extensions {
            enabled.extensions.extend(extensions.iter().cloned());
        }
        enabled
    }

    /// Enabled components of one kind with their bodies, in document order
    pub fn enabled(&self, kind: ComponentKind) -> Vec<(&str, &Value)> {
        let enabled = self.enabled_components();
        self.section(kind)
            .iter()
            .filter(|(name, _)| enabled.contains(kind, name))
            .map(|(name, body)| (name.as_str(), body))
            .collect()
    }

    /// Paths of null values, e.g. `receivers.otlp.protocols.grpc:`, sorted.
    ///
    /// The collector rejects explicit nulls in a few places, so this is a
    /// validation aid.
    pub fn null_objects(&self) -> Vec<String> {
        let sections = [
            ("receivers", &self.receivers),
            ("exporters", &self.exporters),
            ("processors", &self.processors),
            ("extensions", &self.extensions),
            ("connectors", &self.connectors),
        ];
        let mut nulls = Vec::new();
        for (section, components) in sections {
            for (name, body) in components {
                let prefix = format!("{section}.{name}");
                match body {
                    Value::Null => nulls.push(format!("{prefix}:")),
                    Value::Object(map) => collect_nulls(&prefix, map, &mut nulls),
                    _ => {}
                }
            }
        }
        nulls.sort();
        nulls
    }
}

fn collect_nulls(prefix: &str, map: &Map<String, Value>, out: &mut Vec<String>) {
    for (key, value) in map {
        match value {
            Value::Null => out.push(format!("{prefix}.{key}:")),
            Value::Object(nested) => collect_nulls(&format!("{prefix}.{key}"), nested, out),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use otelop_common::Error;
    use serde_json::json;

    const CONFIG: &str = r#"
receivers:
  otlp:
    protocols:
      grpc:
      http:
        endpoint: 0.0.0.0:4318
  jaeger: {}
processors:
  batch:
exporters:
  debug:
    verbosity: detailed
extensions:
  health_check:
  pprof: {}
service:
  extensions: [health_check]
  pipelines:
    traces:
      receivers: [otlp]
      processors: [batch]
      exporters: [debug]
    metrics:
      receivers: [otlp]
      exporters: [debug]
"#;

    #[test]
    fn decodes_sections_in_document_order() {
        let config = CollectorConfig::from_yaml(CONFIG).unwrap();
        let receivers: Vec<&String> = config.receivers.keys().collect();
        assert_eq!(receivers, vec!["otlp", "jaeger"]);
        assert_eq!(config.exporters["debug"], json!({"verbosity": "detailed"}));
        assert_eq!(config.service.pipelines.len(), 2);
    }

    #[test]
    fn empty_document_is_empty_config() {
        assert_eq!(CollectorConfig::from_yaml("").unwrap(), CollectorConfig::default());
    }

    #[test]
    fn scalar_document_is_a_shape_error() {
        let err = CollectorConfig::from_yaml("just a string").unwrap_err();
        assert_eq!(err, Error::shape("string"));
    }

    #[test]
    fn enabled_components_follow_pipelines() {
        let config = CollectorConfig::from_yaml(CONFIG).unwrap();
        let enabled = config.enabled_components();
        assert!(enabled.contains(ComponentKind::Receiver, "otlp"));
        assert!(!enabled.contains(ComponentKind::Receiver, "jaeger"));
        assert!(enabled.contains(ComponentKind::Processor, "batch"));
        assert!(enabled.contains(ComponentKind::Extension, "health_check"));
        assert!(!enabled.contains(ComponentKind::Extension, "pprof"));

        let receivers: Vec<&str> = config
            .enabled(ComponentKind::Receiver)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(receivers, vec!["otlp"]);
    }

    #[test]
    fn null_pipelines_are_ignored() {
        let config = CollectorConfig::from_yaml("service:\n  pipelines:\n    traces:\n").unwrap();
        assert_eq!(config.enabled_components(), EnabledComponents::default());
    }

    #[test]
    fn null_objects_are_reported_sorted() {
        let config = CollectorConfig::from_yaml(CONFIG).unwrap();
        assert_eq!(
            config.null_objects(),
            vec![
                "extensions.health_check:",
                "processors.batch:",
                "receivers.otlp.protocols.grpc:",
            ]
        );
    }

    /// Story: a config written back out can be read again unchanged
    #[test]
    fn story_yaml_survives_a_round_trip() {
        let config = CollectorConfig::from_yaml(CONFIG).unwrap();
        let yaml = config.to_yaml().unwrap();
        assert_eq!(CollectorConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn empty_optional_sections_are_not_written() {
        let yaml = CollectorConfig::default().to_yaml().unwrap();
        assert!(yaml.contains("receivers"));
        assert!(!yaml.contains("connectors"));
        assert!(!yaml.contains("extensions"));
    }
}
