//! `kubeletstats` receiver: node stats access and the node name env var

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::EnvVar;
use k8s_openapi::api::rbac::v1::PolicyRule;
use serde::{Deserialize, Serialize};

use otelop_common::Result;

use crate::builder::Builder;
use crate::component::env_from_field;
use crate::parser::{null_as_default, GenericParser};
use crate::rbac::policy_rule;

/// Metrics that need the kubelet's `/pods` endpoint through `nodes/proxy`
const UTILIZATION_METRICS: [&str; 8] = [
    "k8s.container.cpu_limit_utilization",
    "k8s.container.cpu_request_utilization",
    "k8s.container.memory_limit_utilization",
    "k8s.container.memory_request_utilization",
    "k8s.pod.cpu_limit_utilization",
    "k8s.pod.cpu_request_utilization",
    "k8s.pod.memory_limit_utilization",
    "k8s.pod.memory_request_utilization",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KubeletStatsConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub extra_metadata_labels: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub metrics: BTreeMap<String, Option<MetricConfig>>,
    #[serde(deserialize_with = "null_as_default")]
    pub auth_type: String,
}

impl KubeletStatsConfig {
    fn needs_node_proxy(&self) -> bool {
        if !self.extra_metadata_labels.is_empty() {
            return true;
        }
        UTILIZATION_METRICS.iter().any(|metric| {
            matches!(self.metrics.get(*metric), Some(Some(MetricConfig { enabled: true })))
        })
    }
}

pub fn generate_rbac_rules(cfg: &KubeletStatsConfig) -> Result<Vec<PolicyRule>> {
    let mut rules = vec![policy_rule(&[""], &["nodes/stats"], &["get"])];
    if cfg.needs_node_proxy() {
        rules.push(policy_rule(&[""], &["nodes/proxy"], &["get"]));
    }
    Ok(rules)
}

/// The receiver addresses its own node's kubelet, so the node name is always injected
pub fn generate_env_vars(_cfg: &KubeletStatsConfig) -> Result<Vec<EnvVar>> {
    Ok(vec![env_from_field("K8S_NODE_NAME", "spec.nodeName")])
}

pub fn parser() -> GenericParser<KubeletStatsConfig> {
    Builder::new()
        .with_name("kubeletstats")
        .with_rbac_gen(generate_rbac_rules)
        .with_env_var_gen(generate_env_vars)
        .must_build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use rstest::rstest;
    use serde_json::{json, Value};

    fn resources(rules: &[PolicyRule]) -> Vec<String> {
        rules
            .iter()
            .flat_map(|r| r.resources.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn default_config_only_reads_stats() {
        let rules = parser().get_rbac_rules(&Value::Null).unwrap();
        assert_eq!(resources(&rules), vec!["nodes/stats"]);
        assert_eq!(rules[0].verbs, vec!["get"]);
    }

    #[test]
    fn extra_metadata_labels_need_node_proxy() {
        let rules = parser()
            .get_rbac_rules(&json!({"extra_metadata_labels": ["container.id"]}))
            .unwrap();
        assert_eq!(resources(&rules), vec!["nodes/stats", "nodes/proxy"]);
    }

    #[rstest]
    #[case::container_cpu_limit("k8s.container.cpu_limit_utilization")]
    #[case::container_memory_request("k8s.container.memory_request_utilization")]
    #[case::pod_cpu_request("k8s.pod.cpu_request_utilization")]
    #[case::pod_memory_limit("k8s.pod.memory_limit_utilization")]
    fn utilization_metrics_need_node_proxy(#[case] metric: &str) {
        let config = json!({"metrics": {metric: {"enabled": true}}});
        let rules = parser().get_rbac_rules(&config).unwrap();
        assert_eq!(resources(&rules), vec!["nodes/stats", "nodes/proxy"]);
    }

    #[test]
    fn disabled_or_unrelated_metrics_do_not() {
        let config = json!({"metrics": {
            "k8s.pod.cpu_limit_utilization": {"enabled": false},
            "k8s.node.cpu.usage": {"enabled": true},
            "k8s.pod.memory_limit_utilization": null
        }});
        let rules = parser().get_rbac_rules(&config).unwrap();
        assert_eq!(resources(&rules), vec!["nodes/stats"]);
    }

    #[test]
    fn node_name_env_var_is_always_set() {
        let env = parser().environment_variables(&Value::Null).unwrap();
        assert_eq!(env, vec![env_from_field("K8S_NODE_NAME", "spec.nodeName")]);
    }
}
