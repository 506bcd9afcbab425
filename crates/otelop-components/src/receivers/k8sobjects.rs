//! `k8sobjects` receiver: one rule per watched or pulled object type

use k8s_openapi::api::rbac::v1::PolicyRule;
use serde::{Deserialize, Serialize};

use otelop_common::Result;

use crate::builder::Builder;
use crate::parser::{null_as_default, GenericParser};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sObjectsConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub objects: Vec<K8sObject>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sObject {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// `pull` (the default) or `watch`
    #[serde(deserialize_with = "null_as_default")]
    pub mode: String,
    #[serde(deserialize_with = "null_as_default")]
    pub group: String,
}

pub fn generate_rbac_rules(cfg: &K8sObjectsConfig) -> Result<Vec<PolicyRule>> {
    let rules = cfg
        .objects
        .iter()
        .map(|obj| {
            let mode = if obj.mode.is_empty() { "pull" } else { obj.mode.as_str() };
            let mut verbs = vec!["list".to_string()];
            if mode == "pull" && obj.name != "events" && obj.name != "events.k8s.io" {
                verbs.push("get".to_string());
            } else if mode == "watch" {
                verbs.push("watch".to_string());
            }
            PolicyRule {
                api_groups: Some(vec![obj.group.clone()]),
                resources: Some(vec![obj.name.clone()]),
                verbs,
                ..Default::default()
            }
        })
        .collect();
    Ok(rules)
}

pub fn parser() -> GenericParser<K8sObjectsConfig> {
    Builder::new()
        .with_name("k8sobjects")
        .with_rbac_gen(generate_rbac_rules)
        .must_build()
}
