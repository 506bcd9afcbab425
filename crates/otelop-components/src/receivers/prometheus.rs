//! `prometheus` receiver: namespaced Roles for Kubernetes service discovery
//!
//! Each `kubernetes_sd_configs` entry restricted to a list of namespaces
//! needs read access in exactly those namespaces, so the receiver gets one
//! Role and RoleBinding per (scrape job, namespace) instead of cluster rules.

use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use otelop_common::{naming, Result};

use crate::builder::Builder;
use crate::parser::{null_as_default, CollectorContext, GenericParser};
use crate::rbac::{self, policy_rule, READ_WATCH};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Namespaces {
    #[serde(deserialize_with = "null_as_default")]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KubernetesSdConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub namespaces: Namespaces,
    #[serde(deserialize_with = "null_as_default")]
    pub role: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    #[serde(deserialize_with = "null_as_default")]
    pub job_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub kubernetes_sd_configs: Vec<KubernetesSdConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrometheusConfig {
    pub scrape_configs: Option<Vec<ScrapeConfig>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PrometheusReceiverConfig {
    pub config: Option<PrometheusConfig>,
    /// Opaque to this parser; kept so decoding accepts target allocator configs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_allocator: Option<Value>,
}

impl PrometheusReceiverConfig {
    fn scrape_configs(&self) -> &[ScrapeConfig] {
        self.config
            .as_ref()
            .and_then(|c| c.scrape_configs.as_deref())
            .unwrap_or_default()
    }
}

/// Rule granting what a Kubernetes SD role needs, `None` for unsupported roles
fn rule_for_sd_role(role: &str) -> Option<PolicyRule> {
    let rule = match role {
        "pod" => policy_rule(&[""], &["pods"], &READ_WATCH),
        "node" => policy_rule(&[""], &["nodes"], &READ_WATCH),
        "service" => policy_rule(&[""], &["services"], &READ_WATCH),
        "endpoints" => policy_rule(&[""], &["endpoints", "services"], &READ_WATCH),
        "ingress" => policy_rule(&["networking.k8s.io"], &["ingresses"], &READ_WATCH),
        _ => return None,
    };
    Some(rule)
}

fn role_name(ctx: &CollectorContext, job: &str, component: &str) -> String {
    naming::role(&ctx.name, &format!("{job}-{component}"))
}

fn role_binding_name(ctx: &CollectorContext, job: &str, component: &str) -> String {
    naming::role_binding(&ctx.name, &format!("{job}-{component}"))
}

pub fn generate_roles(
    ctx: &CollectorContext,
    component: &str,
    cfg: &PrometheusReceiverConfig,
) -> Result<Vec<Role>> {
    let mut roles = Vec::new();
    for scrape in cfg.scrape_configs() {
        for sd in &scrape.kubernetes_sd_configs {
            let Some(rule) = rule_for_sd_role(&sd.role) else {
                warn!(role = %sd.role, job = %scrape.job_name, "unsupported role used for prometheus receiver");
                continue;
            };
            let name = role_name(ctx, &scrape.job_name, component);
            for namespace in &sd.namespaces.names {
                roles.push(rbac::role(&name, namespace, rule.clone()));
            }
        }
    }
    Ok(roles)
}

pub fn generate_role_bindings(
    ctx: &CollectorContext,
    component: &str,
    cfg: &PrometheusReceiverConfig,
) -> Result<Vec<RoleBinding>> {
    let mut bindings = Vec::new();
    for scrape in cfg.scrape_configs() {
        for sd in &scrape.kubernetes_sd_configs {
            if rule_for_sd_role(&sd.role).is_none() {
                continue;
            }
            let name = role_binding_name(ctx, &scrape.job_name, component);
            let role = role_name(ctx, &scrape.job_name, component);
            for namespace in &sd.namespaces.names {
                bindings.push(rbac::role_binding(
                    &name,
                    namespace,
                    &role,
                    &ctx.service_account,
                    &ctx.namespace,
                ));
            }
        }
    }
    Ok(bindings)
}

pub fn parser() -> GenericParser<PrometheusReceiverConfig> {
    Builder::new()
        .with_name("prometheus")
        .with_role_gen(generate_roles)
        .with_role_binding_gen(generate_role_bindings)
        .must_build()
}
