//! Kubernetes values aggregated over every enabled component

use k8s_openapi::api::core::v1::{EnvVar, Probe, ServicePort};
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding};
use serde_json::Value;
use tracing::{debug, warn};

use otelop_common::Result;
use otelop_components::{CollectorContext, ComponentKind, ComponentRegistry, Parser};

use crate::config::CollectorConfig;

/// Sections whose components get their defaults filled in
const DEFAULTED_KINDS: [ComponentKind; 3] = [
    ComponentKind::Receiver,
    ComponentKind::Exporter,
    ComponentKind::Extension,
];

impl CollectorConfig {
    /// Run `derive` for every enabled component of the given kinds.
    ///
    /// A component that fails is logged and left out; one broken component
    /// should not hide the others.
    fn collect<T>(
        &self,
        registry: &ComponentRegistry,
        kinds: &[ComponentKind],
        what: &str,
        derive: impl Fn(&dyn Parser, &str, &Value) -> Result<Vec<T>>,
    ) -> Vec<T> {
        let mut out = Vec::new();
        for &kind in kinds {
            let parsers = registry.for_kind(kind);
            for (name, body) in self.enabled(kind) {
                let parser = parsers.parser_for(name);
                match derive(parser.as_ref(), name, body) {
                    Ok(items) => out.extend(items),
                    Err(e) => warn!(%kind, component = %name, error = %e, "skipping component while deriving {what}"),
                }
            }
        }
        out
    }

    /// Service ports of the enabled receivers and exporters, sorted by name
    pub fn all_ports(&self, registry: &ComponentRegistry) -> Vec<ServicePort> {
        let mut ports = self.collect(
            registry,
            &[ComponentKind::Receiver, ComponentKind::Exporter],
            "ports",
            |parser, name, body| parser.ports(name, body),
        );
        ports.sort_by(|a, b| a.name.cmp(&b.name));
        ports
    }

    /// Cluster-wide rules for every enabled component, receivers first
    pub fn all_rbac_rules(&self, registry: &ComponentRegistry) -> Vec<PolicyRule> {
        self.collect(registry, &ComponentKind::ALL, "rbac rules", |parser, _, body| {
            parser.get_rbac_rules(body)
        })
    }

    /// Namespaced Roles the enabled components need
    pub fn all_rbac_roles(&self, registry: &ComponentRegistry, ctx: &CollectorContext) -> Vec<Role> {
        self.collect(registry, &ComponentKind::ALL, "roles", |parser, name, body| {
            parser.rbac_roles(ctx, name, body)
        })
    }

    /// Bindings for [`Self::all_rbac_roles`]
    pub fn all_rbac_role_bindings(
        &self,
        registry: &ComponentRegistry,
        ctx: &CollectorContext,
    ) -> Vec<RoleBinding> {
        self.collect(registry, &ComponentKind::ALL, "role bindings", |parser, name, body| {
            parser.rbac_role_bindings(ctx, name, body)
        })
    }

    pub fn liveness_probe(&self, registry: &ComponentRegistry) -> Option<Probe> {
        self.first_probe(registry, "liveness", |parser, body| parser.liveness_probe(body))
    }

    pub fn readiness_probe(&self, registry: &ComponentRegistry) -> Option<Probe> {
        self.first_probe(registry, "readiness", |parser, body| parser.readiness_probe(body))
    }

    pub fn startup_probe(&self, registry: &ComponentRegistry) -> Option<Probe> {
        self.first_probe(registry, "startup", |parser, body| parser.startup_probe(body))
    }

    /// First probe any enabled extension offers, in document order
    fn first_probe(
        &self,
        registry: &ComponentRegistry,
        what: &str,
        derive: impl Fn(&dyn Parser, &Value) -> Result<Option<Probe>>,
    ) -> Option<Probe> {
        let parsers = registry.for_kind(ComponentKind::Extension);
        self.enabled(ComponentKind::Extension)
            .into_iter()
            .find_map(|(name, body)| match derive(parsers.parser_for(name).as_ref(), body) {
                Ok(probe) => probe,
                Err(e) => {
                    warn!(component = %name, error = %e, "skipping extension while deriving {what} probe");
                    None
                }
            })
    }

    /// Env vars every enabled component needs in the collector container
    pub fn environment_variables(&self, registry: &ComponentRegistry) -> Vec<EnvVar> {
        self.collect(registry, &ComponentKind::ALL, "env vars", |parser, _, body| {
            parser.environment_variables(body)
        })
    }

    /// Replace receiver, exporter and extension bodies with their defaulted form.
    ///
    /// Returns one line per component that changed. Unlike the read-only
    /// aggregations this stops at the first failure and leaves the document
    /// untouched.
    pub fn apply_defaults(&mut self, registry: &ComponentRegistry) -> Result<Vec<String>> {
        let mut changes = Vec::new();
        for kind in DEFAULTED_KINDS {
            let parsers = registry.for_kind(kind);
            for (name, body) in self.section(kind) {
                let defaulted = parsers.parser_for(name).get_default_config(body)?;
                if defaulted != *body {
                    changes.push((kind, name.clone(), defaulted));
                }
            }
        }

        let mut events = Vec::with_capacity(changes.len());
        for (kind, name, defaulted) in changes {
            debug!(%kind, component = %name, "applied defaults");
            events.push(format!("{}.{name}: defaults applied", kind.section()));
            self.section_mut(kind).insert(name, defaulted);
        }
        Ok(events)
    }
}
