//! RBAC a collector needs for its enabled components

use std::io::Write;

use clap::Args;
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding};
use serde::Serialize;

use otelop_components::{CollectorContext, ComponentRegistry};
use otelop_config::CollectorConfig;

use super::{write_yaml, ConfigArgs};

#[derive(Args, Debug)]
pub struct RbacArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Name of the collector owning the config
    #[arg(long, env = "OTELOP_COLLECTOR_NAME")]
    pub name: String,

    /// Namespace the collector runs in
    #[arg(long, env = "OTELOP_COLLECTOR_NAMESPACE", default_value = "default")]
    pub namespace: String,

    /// Service account the collector runs as (defaults to `<name>-collector`)
    #[arg(long, env = "OTELOP_SERVICE_ACCOUNT")]
    pub service_account: Option<String>,
}

impl RbacArgs {
    fn context(&self) -> CollectorContext {
        let ctx = CollectorContext::new(&self.name, &self.namespace);
        match &self.service_account {
            Some(sa) => ctx.with_service_account(sa),
            None => ctx,
        }
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Rbac {
    cluster_rules: Vec<PolicyRule>,
    roles: Vec<Role>,
    role_bindings: Vec<RoleBinding>,
}

pub fn run(args: RbacArgs, out: &mut impl Write) -> anyhow::Result<()> {
    let config = args.config.load()?;
    write_yaml(out, &derive(&config, &args.context()))
}

fn derive(config: &CollectorConfig, ctx: &CollectorContext) -> Rbac {
    let registry = ComponentRegistry::builtin();
    Rbac {
        cluster_rules: config.all_rbac_rules(&registry),
        roles: config.all_rbac_roles(&registry, ctx),
        role_bindings: config.all_rbac_role_bindings(&registry, ctx),
    }
}
