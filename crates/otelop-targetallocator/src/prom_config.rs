//! Locating the prometheus receiver and its scrape configs

use serde_json::{Map, Value};

use otelop_common::yaml::parse_yaml;
use otelop_common::Result;

use crate::errors::{no_component, not_a_list, not_a_list_at, not_a_map, not_a_map_at, not_a_string_at};

/// Body of the `receivers.prometheus` block
pub type PromConfig = Map<String, Value>;

const RELABEL_SECTIONS: [(&str, &str); 2] = [
    ("relabel_configs", "relabel_config"),
    ("metric_relabel_configs", "metric_relabel_config"),
];

/// Extract the `receivers.prometheus` map from a collector YAML document
pub fn config_to_prom_config(cfg: &str) -> Result<PromConfig> {
    let mut doc = parse_yaml(cfg)?;
    let receivers = doc
        .get_mut("receivers")
        .ok_or_else(|| no_component("receivers"))?
        .as_object_mut()
        .ok_or_else(|| not_a_map("receivers"))?;
    match receivers.remove("prometheus") {
        None => Err(no_component("prometheus")),
        Some(Value::Object(prometheus)) => Ok(prometheus),
        Some(_) => Err(not_a_map("prometheus")),
    }
}

/// The `config` map inside the receiver block
pub(crate) fn prometheus_config_mut(prometheus: &mut PromConfig) -> Result<&mut Map<String, Value>> {
    prometheus
        .get_mut("config")
        .ok_or_else(|| no_component("prometheusConfig"))?
        .as_object_mut()
        .ok_or_else(|| not_a_map("prometheusConfig"))
}

/// The `config.scrape_configs` list inside the receiver block
pub(crate) fn scrape_configs(prometheus: &PromConfig) -> Result<&Vec<Value>> {
    prometheus
        .get("config")
        .ok_or_else(|| no_component("prometheusConfig"))?
        .as_object()
        .ok_or_else(|| not_a_map("prometheusConfig"))?
        .get("scrape_configs")
        .ok_or_else(|| no_component("scrape_configs"))?
        .as_array()
        .ok_or_else(|| not_a_list("scrape_configs"))
}

pub(crate) fn scrape_configs_mut(prometheus: &mut PromConfig) -> Result<&mut Vec<Value>> {
    prometheus_config_mut(prometheus)?
        .get_mut("scrape_configs")
        .ok_or_else(|| no_component("scrape_configs"))?
        .as_array_mut()
        .ok_or_else(|| not_a_list("scrape_configs"))
}

/// Undo `$$` escaping in relabel `replacement` values.
///
/// Collector config treats `$` as an env var marker, so capture group
/// references in relabel replacements are written as `$$1`. Prometheus
/// itself needs the single form. Only `replacement` fields change.
pub fn unescape_dollar_signs_in_prom_config(cfg: &str) -> Result<PromConfig> {
    let mut prometheus = config_to_prom_config(cfg)?;
    for (i, scrape) in scrape_configs_mut(&mut prometheus)?.iter_mut().enumerate() {
        let scrape = scrape.as_object_mut().ok_or_else(|| not_a_map_at("scrape_config", i))?;
        for (section, entry) in RELABEL_SECTIONS {
            let Some(relabels) = scrape.get_mut(section) else {
                continue;
            };
            let relabels = relabels.as_array_mut().ok_or_else(|| not_a_list_at(section, i))?;
            for (j, relabel) in relabels.iter_mut().enumerate() {
                let relabel = relabel.as_object_mut().ok_or_else(|| not_a_map_at(entry, j))?;
                let Some(replacement) = relabel.get_mut("replacement") else {
                    continue;
                };
                let unescaped = replacement
                    .as_str()
                    .ok_or_else(|| not_a_string_at("replacement", j))?
                    .replace("$$", "$");
                *replacement = Value::String(unescaped);
            }
        }
    }
    Ok(prometheus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use otelop_common::Error;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn extracts_the_prometheus_receiver() {
        let cfg = r#"
receivers:
  prometheus:
    config:
      scrape_configs:
        - job_name: otel-collector
          scrape_interval: 10s
  otlp: {}
"#;
        let prom = config_to_prom_config(cfg).unwrap();
        assert_eq!(
            Value::Object(prom),
            json!({"config": {"scrape_configs": [{"job_name": "otel-collector", "scrape_interval": "10s"}]}})
        );
    }

    #[rstest]
    #[case::no_receivers("exporters: {}", "no receivers available as part of the configuration")]
    #[case::receivers_not_a_map(
        "receivers: [prometheus]",
        "receivers property in the configuration doesn't contain valid receivers"
    )]
    #[case::no_prometheus("receivers:\n  otlp: {}", "no prometheus available as part of the configuration")]
    #[case::prometheus_not_a_map(
        "receivers:\n  prometheus: yes",
        "prometheus property in the configuration doesn't contain valid prometheus"
    )]
    fn locating_the_receiver_fails(#[case] cfg: &str, #[case] message: &str) {
        assert_eq!(config_to_prom_config(cfg).unwrap_err(), Error::config(message));
    }

    /// Story: capture group references survive, labels and regexes do not change
    #[test]
    fn story_only_replacements_are_unescaped() {
        let cfg = r#"
receivers:
  prometheus:
    config:
      scrape_configs:
        - job_name: service-x
          relabel_configs:
            - source_labels: ['$$foo']
              regex: (.*)
              replacement: $$1_$$2
              target_label: bar
            - action: drop
          metric_relabel_configs:
            - replacement: $$1
              regex: $$x
"#;
        let prom = unescape_dollar_signs_in_prom_config(cfg).unwrap();
        let scrape = &prom["config"]["scrape_configs"][0];
        assert_eq!(scrape["relabel_configs"][0]["replacement"], "$1_$2");
        assert_eq!(scrape["relabel_configs"][0]["source_labels"][0], "$$foo");
        assert_eq!(scrape["relabel_configs"][1], json!({"action": "drop"}));
        assert_eq!(scrape["metric_relabel_configs"][0]["replacement"], "$1");
        assert_eq!(scrape["metric_relabel_configs"][0]["regex"], "$$x");
    }

    #[test]
    fn metric_relabels_are_unescaped_without_relabels() {
        let cfg = r#"
receivers:
  prometheus:
    config:
      scrape_configs:
        - job_name: only-metrics
          metric_relabel_configs:
            - replacement: $$1
"#;
        let prom = unescape_dollar_signs_in_prom_config(cfg).unwrap();
        assert_eq!(
            prom["config"]["scrape_configs"][0]["metric_relabel_configs"][0]["replacement"],
            "$1"
        );
    }

    #[rstest]
    #[case::no_config("receivers:\n  prometheus: {}", "no prometheusConfig available as part of the configuration")]
    #[case::no_scrape_configs(
        "receivers:\n  prometheus:\n    config: {}",
        "no scrape_configs available as part of the configuration"
    )]
    #[case::scrape_configs_not_a_list(
        "receivers:\n  prometheus:\n    config:\n      scrape_configs: {}",
        "scrape_configs must be a list in the config"
    )]
    #[case::scrape_config_not_a_map(
        "receivers:\n  prometheus:\n    config:\n      scrape_configs: [job]",
        "index 0: scrape_config property in the configuration doesn't contain a valid map: scrape_config"
    )]
    #[case::relabels_not_a_list(
        "receivers:\n  prometheus:\n    config:\n      scrape_configs:\n        - relabel_configs: x",
        "index 0: relabel_configs property in the configuration doesn't contain a valid index: relabel_configs"
    )]
    #[case::replacement_not_a_string(
        "receivers:\n  prometheus:\n    config:\n      scrape_configs:\n        - relabel_configs:\n            - replacement: 1",
        "index 0: replacement property in the configuration doesn't contain a valid string: replacement"
    )]
    fn unescaping_rejects_malformed_configs(#[case] cfg: &str, #[case] message: &str) {
        assert_eq!(
            unescape_dollar_signs_in_prom_config(cfg).unwrap_err(),
            Error::config(message)
        );
    }
}
