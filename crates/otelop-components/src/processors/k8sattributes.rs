//! `k8sattributes` processor
//!
//! Pod and namespace metadata is always read. Deployment metadata is
//! resolved through ReplicaSets and node metadata needs the Node objects,
//! so those rules depend on which keys `extract.metadata` asks for.

use k8s_openapi::api::core::v1::EnvVar;
use k8s_openapi::api::rbac::v1::PolicyRule;
use serde::{Deserialize, Serialize};

use otelop_common::Result;

use crate::builder::Builder;
use crate::component::env_from_field;
use crate::parser::{null_as_default, GenericParser};
use crate::rbac::{policy_rule, READ_WATCH};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Extract {
    #[serde(deserialize_with = "null_as_default")]
    pub metadata: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Filter {
    #[serde(deserialize_with = "null_as_default")]
    pub node_from_env_var: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sAttributesConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub extract: Extract,
    #[serde(deserialize_with = "null_as_default")]
    pub filter: Filter,
}

fn is_deployment_key(key: &str) -> bool {
    key == "k8s.deployment.uid" || key == "k8s.deployment.name"
}

pub fn generate_rbac_rules(cfg: &K8sAttributesConfig) -> Result<Vec<PolicyRule>> {
    let replicasets = || policy_rule(&["apps"], &["replicasets"], &READ_WATCH);
    let mut rules = vec![policy_rule(&[""], &["pods", "namespaces"], &READ_WATCH)];

    let metadata = &cfg.extract.metadata;
    if metadata.is_empty() {
        rules.push(replicasets());
    }
    let mut added_replicasets = false;
    let mut added_nodes = false;
    for key in metadata {
        if is_deployment_key(key) {
            if !added_replicasets {
                rules.push(replicasets());
                added_replicasets = true;
            }
        } else if key.contains("k8s.node") && !added_nodes {
            rules.push(policy_rule(&[""], &["nodes"], &READ_WATCH));
            added_nodes = true;
        }
    }
    Ok(rules)
}

/// Filtering by node needs the node name in the env var the filter names
pub fn generate_env_vars(cfg: &K8sAttributesConfig) -> Result<Vec<EnvVar>> {
    let name = &cfg.filter.node_from_env_var;
    if name.is_empty() {
        return Ok(Vec::new());
    }
    Ok(vec![env_from_field(name, "spec.nodeName")])
}

pub fn parser() -> GenericParser<K8sAttributesConfig> {
    Builder::new()
        .with_name("k8sattributes")
        .with_rbac_gen(generate_rbac_rules)
        .with_env_var_gen(generate_env_vars)
        .must_build()
}
