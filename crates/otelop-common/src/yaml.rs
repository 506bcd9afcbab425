//! YAML loading and dumping
//!
//! Collector configuration arrives as YAML. It is parsed with yaml-rust2 and
//! converted into `serde_json::Value` so the parsers work on one generic tree,
//! and written back out with serde_yaml.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use yaml_rust2::{Yaml, YamlLoader};

use crate::{Error, Result};

/// Parse a YAML string into a `serde_json::Value`.
///
/// Only the first document is returned; empty input yields `Value::Null`.
pub fn parse_yaml(input: &str) -> Result<Value> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| Error::yaml(e.to_string()))?;
    match docs.into_iter().next() {
        Some(doc) => yaml_to_json(doc),
        None => Ok(Value::Null),
    }
}

/// Serialize any value as a YAML document
pub fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_yaml::to_string(value)?)
}

fn yaml_to_json(yaml: Yaml) -> Result<Value> {
    match yaml {
        Yaml::Null => Ok(Value::Null),
        Yaml::Boolean(b) => Ok(Value::Bool(b)),
        Yaml::Integer(i) => Ok(Value::Number(i.into())),
        Yaml::Real(s) => {
            let f: f64 = s
                .parse()
                .map_err(|e: std::num::ParseFloatError| Error::yaml(e.to_string()))?;
            Ok(Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null))
        }
        Yaml::String(s) => Ok(Value::String(s)),
        Yaml::Array(arr) => arr
            .into_iter()
            .map(yaml_to_json)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Yaml::Hash(map) => map
            .into_iter()
            .map(|(k, v)| {
                let key = match k {
                    Yaml::String(s) => s,
                    Yaml::Integer(i) => i.to_string(),
                    Yaml::Real(r) => r,
                    Yaml::Boolean(b) => b.to_string(),
                    Yaml::Null => "null".to_string(),
                    _ => return Err(Error::yaml("unsupported YAML key type")),
                };
                yaml_to_json(v).map(|v| (key, v))
            })
            .collect::<Result<Map<String, Value>>>()
            .map(Value::Object),
        Yaml::Alias(_) => Err(Error::yaml("YAML aliases not supported")),
        Yaml::BadValue => Err(Error::yaml("bad YAML value")),
    }
}

/// Name the JSON kind of a value the way shape errors report it
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_a_collector_document() {
        let yaml = r#"
receivers:
  otlp:
    protocols:
      grpc:
        endpoint: 0.0.0.0:4317
service:
  pipelines:
    traces:
      receivers: [otlp]
"#;
        let value = parse_yaml(yaml).unwrap();
        assert_eq!(
            value["receivers"]["otlp"]["protocols"]["grpc"]["endpoint"],
            "0.0.0.0:4317"
        );
        assert_eq!(value["service"]["pipelines"]["traces"]["receivers"][0], "otlp");
    }

    #[test]
    fn keeps_null_components() {
        let value = parse_yaml("receivers:\n  zipkin:\n").unwrap();
        assert_eq!(value["receivers"]["zipkin"], Value::Null);
        assert!(value["receivers"].as_object().unwrap().contains_key("zipkin"));
    }

    #[test]
    fn preserves_key_order() {
        let value = parse_yaml("b: 1\na: 2\nc: 3").unwrap();
        let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn empty_input_is_null() {
        assert_eq!(parse_yaml("").unwrap(), Value::Null);
    }

    #[test]
    fn invalid_yaml_is_a_yaml_error() {
        let err = parse_yaml("not: valid: yaml: {{").unwrap_err();
        assert!(matches!(err, Error::Yaml { .. }));
    }

    #[test]
    fn dumps_back_to_yaml() {
        let out = to_yaml(&json!({"exporters": {"debug": null}})).unwrap();
        let again = parse_yaml(&out).unwrap();
        assert_eq!(again, json!({"exporters": {"debug": null}}));
    }

    #[test]
    fn kinds() {
        assert_eq!(kind_of(&json!("hi")), "string");
        assert_eq!(kind_of(&json!([1])), "array");
        assert_eq!(kind_of(&json!(1)), "number");
        assert_eq!(kind_of(&json!(true)), "bool");
    }
}
