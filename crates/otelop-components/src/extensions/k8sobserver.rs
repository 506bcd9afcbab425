//! `k8s_observer` extension: read access to whatever it is told to observe

use k8s_openapi::api::rbac::v1::PolicyRule;
use serde::{Deserialize, Serialize};

use otelop_common::Result;

use crate::builder::Builder;
use crate::parser::GenericParser;
use crate::rbac::policy_rule;

const VERBS: [&str; 2] = ["list", "watch"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct K8sObserverConfig {
    pub observe_pods: bool,
    pub observe_nodes: bool,
    pub observe_services: bool,
    pub observe_ingresses: bool,
}

impl Default for K8sObserverConfig {
    fn default() -> Self {
        Self {
            observe_pods: true,
            observe_nodes: false,
            observe_services: false,
            observe_ingresses: false,
        }
    }
}

pub fn generate_rbac_rules(cfg: &K8sObserverConfig) -> Result<Vec<PolicyRule>> {
    let mut rules = Vec::new();
    if cfg.observe_pods {
        rules.push(policy_rule(&[""], &["pods"], &VERBS));
    }
    if cfg.observe_nodes {
        rules.push(policy_rule(&[""], &["nodes"], &VERBS));
    }
    if cfg.observe_services {
        rules.push(policy_rule(&[""], &["services"], &VERBS));
    }
    if cfg.observe_ingresses {
        rules.push(policy_rule(&["networking.k8s.io"], &["ingresses"], &VERBS));
    }
    Ok(rules)
}

pub fn parser() -> GenericParser<K8sObserverConfig> {
    Builder::new()
        .with_name("k8s_observer")
        .with_rbac_gen(generate_rbac_rules)
        .must_build()
}
