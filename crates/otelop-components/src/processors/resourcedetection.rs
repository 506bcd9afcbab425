//! `resourcedetection` processor: permissions per enabled detector

use k8s_openapi::api::core::v1::EnvVar;
use k8s_openapi::api::rbac::v1::PolicyRule;
use serde::{Deserialize, Serialize};

use otelop_common::Result;

use crate::builder::Builder;
use crate::component::env_from_field;
use crate::parser::{null_as_default, GenericParser};
use crate::rbac::policy_rule;

/// Env var the `k8snode` detector reads unless configured otherwise
pub const DEFAULT_NODE_ENV_VAR: &str = "K8S_NODE_NAME";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sNodeConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub node_from_env_var: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceDetectionConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub detectors: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub k8snode: K8sNodeConfig,
}

impl ResourceDetectionConfig {
    fn uses(&self, detector: &str) -> bool {
        self.detectors.iter().any(|d| d == detector)
    }
}

pub fn generate_rbac_rules(cfg: &ResourceDetectionConfig) -> Result<Vec<PolicyRule>> {
    let mut rules = Vec::new();
    for detector in &cfg.detectors {
        match detector.as_str() {
            "k8snode" => rules.push(policy_rule(&[""], &["nodes"], &["get", "list"])),
            "openshift" => rules.push(policy_rule(
                &["config.openshift.io"],
                &["infrastructures", "infrastructures/status"],
                &["get", "watch", "list"],
            )),
            _ => {}
        }
    }
    Ok(rules)
}

pub fn generate_env_vars(cfg: &ResourceDetectionConfig) -> Result<Vec<EnvVar>> {
    if !cfg.uses("k8snode") {
        return Ok(Vec::new());
    }
    let name = match cfg.k8snode.node_from_env_var.as_str() {
        "" => DEFAULT_NODE_ENV_VAR,
        name => name,
    };
    Ok(vec![env_from_field(name, "spec.nodeName")])
}

pub fn parser() -> GenericParser<ResourceDetectionConfig> {
    Builder::new()
        .with_name("resourcedetection")
        .with_rbac_gen(generate_rbac_rules)
        .with_env_var_gen(generate_env_vars)
        .must_build()
}
