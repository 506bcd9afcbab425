//! `k8s_cluster` and `k8s_events` receivers: cluster-wide read access

use k8s_openapi::api::rbac::v1::PolicyRule;
use serde::{Deserialize, Serialize};

use otelop_common::Result;

use crate::builder::Builder;
use crate::parser::{null_as_default, GenericParser};
use crate::rbac::policy_rule;

const VERBS: [&str; 3] = ["get", "list", "watch"];

const CORE_RESOURCES: [&str; 11] = [
    "events",
    "namespaces",
    "namespaces/status",
    "nodes",
    "nodes/spec",
    "pods",
    "pods/status",
    "replicationcontrollers",
    "replicationcontrollers/status",
    "resourcequotas",
    "services",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sClusterConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub distribution: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sEventsConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub namespaces: Vec<String>,
}

pub fn generate_rbac_rules(cfg: &K8sClusterConfig) -> Result<Vec<PolicyRule>> {
    let mut rules = vec![
        policy_rule(&[""], &CORE_RESOURCES, &VERBS),
        policy_rule(
            &["apps"],
            &["daemonsets", "deployments", "replicasets", "statefulsets"],
            &VERBS,
        ),
        policy_rule(
            &["extensions"],
            &["daemonsets", "deployments", "replicasets"],
            &VERBS,
        ),
        policy_rule(&["batch"], &["jobs", "cronjobs"], &VERBS),
        policy_rule(&["autoscaling"], &["horizontalpodautoscalers"], &VERBS),
    ];
    if cfg.distribution == "openshift" {
        rules.push(policy_rule(
            &["quota.openshift.io"],
            &["clusterresourcequotas"],
            &VERBS,
        ));
    }
    Ok(rules)
}

pub fn generate_events_rbac_rules(_cfg: &K8sEventsConfig) -> Result<Vec<PolicyRule>> {
    Ok(vec![policy_rule(&[""], &CORE_RESOURCES, &VERBS)])
}

pub fn parser() -> GenericParser<K8sClusterConfig> {
    Builder::new()
        .with_name("k8s_cluster")
        .with_rbac_gen(generate_rbac_rules)
        .must_build()
}

pub fn events_parser() -> GenericParser<K8sEventsConfig> {
    Builder::new()
        .with_name("k8s_events")
        .with_rbac_gen(generate_events_rbac_rules)
        .must_build()
}
