//! The uniform parser contract and its generic implementation

use k8s_openapi::api::core::v1::{EnvVar, Probe, ServicePort};
use k8s_openapi::api::rbac::v1::{PolicyRule, Role, RoleBinding};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use otelop_common::yaml::kind_of;
use otelop_common::{naming, Error, Result};

use crate::builder::Settings;
use crate::component::{component_type, UNSET_PORT};

/// Derive ports for a component from its name, default port and decoded config
pub type PortParser<C> = fn(&str, &ServicePort, &C) -> Result<Vec<ServicePort>>;

/// Derive cluster-wide RBAC rules from decoded config
pub type RbacRuleGenerator<C> = fn(&C) -> Result<Vec<PolicyRule>>;

/// Derive namespaced Roles from the owning collector, component name and config
pub type RoleGenerator<C> = fn(&CollectorContext, &str, &C) -> Result<Vec<Role>>;

/// Derive RoleBindings from the owning collector, component name and config
pub type RoleBindingGenerator<C> = fn(&CollectorContext, &str, &C) -> Result<Vec<RoleBinding>>;

/// Derive a probe from decoded config
pub type ProbeGenerator<C> = fn(&C) -> Result<Option<Probe>>;

/// Derive env vars from decoded config
pub type EnvVarGenerator<C> = fn(&C) -> Result<Vec<EnvVar>>;

/// Fill in defaults given the recommended address and default port
pub type Defaulter<C> = fn(&str, i32, C) -> Result<C>;

/// Identity of the collector that owns the components being parsed.
///
/// Only namespaced RBAC needs it: Role names embed the collector name and
/// bindings point at its service account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorContext {
    pub name: String,
    pub namespace: String,
    pub service_account: String,
}

impl CollectorContext {
    /// Context using the collector's default service account name
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let name = name.into();
        let service_account = naming::service_account(&name);
        Self {
            name,
            namespace: namespace.into(),
            service_account,
        }
    }

    /// Override the service account the bindings refer to
    pub fn with_service_account(mut self, service_account: impl Into<String>) -> Self {
        self.service_account = service_account.into();
        self
    }
}

/// Contract shared by every component parser.
///
/// All methods take the component's raw configuration. `Value::Null` means
/// the component was listed without a body and decodes to the empty config.
pub trait Parser: Send + Sync {
    /// Component type this parser is registered under
    fn parser_type(&self) -> &str;

    /// Internal identifier, `__` followed by the full component name
    fn parser_name(&self) -> String;

    /// Raw config with a missing listen endpoint filled in
    fn get_default_config(&self, config: &Value) -> Result<Value>;

    /// Service ports the component listens on
    fn ports(&self, name: &str, config: &Value) -> Result<Vec<ServicePort>>;

    /// Cluster-wide RBAC rules the component needs
    fn get_rbac_rules(&self, config: &Value) -> Result<Vec<PolicyRule>>;

    /// Namespaced Roles the component needs
    fn rbac_roles(
        &self,
        _ctx: &CollectorContext,
        _name: &str,
        _config: &Value,
    ) -> Result<Vec<Role>> {
        Ok(Vec::new())
    }

    /// Bindings for [`Parser::rbac_roles`]
    fn rbac_role_bindings(
        &self,
        _ctx: &CollectorContext,
        _name: &str,
        _config: &Value,
    ) -> Result<Vec<RoleBinding>> {
        Ok(Vec::new())
    }

    fn liveness_probe(&self, config: &Value) -> Result<Option<Probe>>;

    fn readiness_probe(&self, config: &Value) -> Result<Option<Probe>>;

    fn startup_probe(&self, config: &Value) -> Result<Option<Probe>>;

    /// Env vars the collector container needs for this component
    fn environment_variables(&self, config: &Value) -> Result<Vec<EnvVar>>;
}

/// A typed configuration shape a parser decodes raw config into
pub trait ComponentConfig: DeserializeOwned + Serialize + Default + Send + Sync + 'static {}

impl<T> ComponentConfig for T where T: DeserializeOwned + Serialize + Default + Send + Sync + 'static {}

/// Decode raw config into a typed shape.
///
/// Null decodes to the default value; anything other than a map is a shape
/// error naming what was found.
pub fn decode<C: ComponentConfig>(config: &Value) -> Result<C> {
    match config {
        Value::Null => Ok(C::default()),
        Value::Object(_) => Ok(serde_json::from_value(config.clone())?),
        other => Err(Error::shape(kind_of(other))),
    }
}

/// Serde helper treating an explicit `null` like a missing field
pub fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Overlay `defaults` onto `raw`, keeping every key `raw` has that `defaults` lacks
pub fn merge_defaults(raw: &Value, defaults: Value) -> Value {
    match (raw, defaults) {
        (Value::Object(base), Value::Object(patch)) => {
            let mut merged = base.clone();
            for (key, value) in patch {
                let current = merged.get(&key).cloned().unwrap_or(Value::Null);
                merged.insert(key, merge_defaults(&current, value));
            }
            Value::Object(merged)
        }
        (_, patch) => patch,
    }
}

/// Parser assembled from a typed config shape and plain derivation functions
pub struct GenericParser<C> {
    name: String,
    settings: Settings<C>,
}

impl<C: ComponentConfig> GenericParser<C> {
    pub(crate) fn from_settings(settings: Settings<C>) -> Self {
        Self {
            name: settings.name.clone(),
            settings,
        }
    }

    /// Settings the parser was built from
    pub fn settings(&self) -> &Settings<C> {
        &self.settings
    }

    fn probe(&self, generator: Option<ProbeGenerator<C>>, config: &Value) -> Result<Option<Probe>> {
        match generator {
            Some(generate) => generate(&decode(config)?),
            None => Ok(None),
        }
    }
}

impl<C: ComponentConfig> Parser for GenericParser<C> {
    fn parser_type(&self) -> &str {
        component_type(&self.name)
    }

    fn parser_name(&self) -> String {
        format!("__{}", self.name)
    }

    fn get_default_config(&self, config: &Value) -> Result<Value> {
        let Some(apply) = self.settings.defaults_applier else {
            return Ok(config.clone());
        };
        if self.settings.default_rec_addr.is_empty() || self.settings.port == UNSET_PORT {
            return Ok(config.clone());
        }
        let parsed: C = decode(config)?;
        let defaulted = apply(&self.settings.default_rec_addr, self.settings.port, parsed)?;
        debug!(component = %self.name, "applied default listen address");
        Ok(merge_defaults(config, serde_json::to_value(defaulted)?))
    }

    fn ports(&self, name: &str, config: &Value) -> Result<Vec<ServicePort>> {
        let Some(parse) = self.settings.port_parser else {
            return Ok(Vec::new());
        };
        let parsed: C = decode(config)?;
        parse(name, &self.settings.service_port(), &parsed)
    }

    fn get_rbac_rules(&self, config: &Value) -> Result<Vec<PolicyRule>> {
        match self.settings.rbac_gen {
            Some(generate) => generate(&decode(config)?),
            None => Ok(Vec::new()),
        }
    }

    fn rbac_roles(&self, ctx: &CollectorContext, name: &str, config: &Value) -> Result<Vec<Role>> {
        match self.settings.role_gen {
            Some(generate) => generate(ctx, name, &decode(config)?),
            None => Ok(Vec::new()),
        }
    }

    fn rbac_role_bindings(
        &self,
        ctx: &CollectorContext,
        name: &str,
        config: &Value,
    ) -> Result<Vec<RoleBinding>> {
        match self.settings.role_binding_gen {
            Some(generate) => generate(ctx, name, &decode(config)?),
            None => Ok(Vec::new()),
        }
    }

    fn liveness_probe(&self, config: &Value) -> Result<Option<Probe>> {
        self.probe(self.settings.liveness_gen, config)
    }

    fn readiness_probe(&self, config: &Value) -> Result<Option<Probe>> {
        self.probe(self.settings.readiness_gen, config)
    }

    fn startup_probe(&self, config: &Value) -> Result<Option<Probe>> {
        self.probe(self.settings.startup_gen, config)
    }

    fn environment_variables(&self, config: &Value) -> Result<Vec<EnvVar>> {
        match self.settings.env_var_gen {
            Some(generate) => generate(&decode(config)?),
            None => Ok(Vec::new()),
        }
    }
}

/// Parser that derives nothing and leaves config untouched
#[derive(Debug, Clone)]
pub struct Nop {
    name: String,
}

impl Nop {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Parser for Nop {
    fn parser_type(&self) -> &str {
        component_type(&self.name)
    }

    fn parser_name(&self) -> String {
        format!("__{}", self.name)
    }

    fn get_default_config(&self, config: &Value) -> Result<Value> {
        Ok(config.clone())
    }

    fn ports(&self, _name: &str, _config: &Value) -> Result<Vec<ServicePort>> {
        Ok(Vec::new())
    }

    fn get_rbac_rules(&self, _config: &Value) -> Result<Vec<PolicyRule>> {
        Ok(Vec::new())
    }

    fn liveness_probe(&self, _config: &Value) -> Result<Option<Probe>> {
        Ok(None)
    }

    fn readiness_probe(&self, _config: &Value) -> Result<Option<Probe>> {
        Ok(None)
    }

    fn startup_probe(&self, _config: &Value) -> Result<Option<Probe>> {
        Ok(None)
    }

    fn environment_variables(&self, _config: &Value) -> Result<Vec<EnvVar>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Builder;
    use crate::component::construct_service_port;
    use crate::rbac::policy_rule;
    use k8s_openapi::api::core::v1::HTTPGetAction;
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
    use rstest::rstest;
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    struct TestConfig {
        #[serde(skip_serializing_if = "String::is_empty")]
        endpoint: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    }

    fn test_ports(name: &str, default: &ServicePort, _cfg: &TestConfig) -> Result<Vec<ServicePort>> {
        let mut port = construct_service_port(default, default.port);
        port.name = Some(naming::port_name(name, default.port));
        Ok(vec![port])
    }

    fn test_rules(_cfg: &TestConfig) -> Result<Vec<PolicyRule>> {
        Ok(vec![policy_rule(&[""], &["pods"], &["get"])])
    }

    fn test_probe(cfg: &TestConfig) -> Result<Option<Probe>> {
        Ok(Some(Probe {
            http_get: Some(HTTPGetAction {
                path: cfg.path.clone(),
                port: IntOrString::Int(1234),
                ..Default::default()
            }),
            ..Default::default()
        }))
    }

    fn test_defaults(addr: &str, port: i32, mut cfg: TestConfig) -> Result<TestConfig> {
        if cfg.endpoint.is_empty() {
            cfg.endpoint = format!("{addr}:{port}");
        }
        Ok(cfg)
    }

    fn full_parser() -> GenericParser<TestConfig> {
        Builder::new()
            .with_name("test/one")
            .with_port(1234)
            .with_default_rec_address("0.0.0.0")
            .with_port_parser(test_ports)
            .with_rbac_gen(test_rules)
            .with_liveness_gen(test_probe)
            .with_defaults_applier(test_defaults)
            .must_build()
    }

    #[rstest]
    #[case::string(json!("hi"), "string")]
    #[case::number(json!(12), "number")]
    #[case::array(json!([1, 2]), "array")]
    #[case::bool(json!(true), "bool")]
    fn decode_rejects_non_maps(#[case] config: Value, #[case] kind: &str) {
        let err = decode::<TestConfig>(&config).unwrap_err();
        assert_eq!(err, Error::shape(kind));
        assert_eq!(err.to_string(), format!("expected a map, got '{kind}'"));
    }

    #[test]
    fn decode_treats_null_as_empty() {
        let cfg: TestConfig = decode(&Value::Null).unwrap();
        assert!(cfg.endpoint.is_empty());
        assert!(cfg.path.is_none());
    }

    #[test]
    fn decode_reports_type_mismatches() {
        let err = decode::<TestConfig>(&json!({"endpoint": 123})).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn generic_parser_dispatches_to_its_functions() {
        let parser = full_parser();
        assert_eq!(parser.parser_type(), "test");
        assert_eq!(parser.parser_name(), "__test/one");

        let ports = parser.ports("test/one", &Value::Null).unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].name.as_deref(), Some("test-one"));

        let rules = parser.get_rbac_rules(&json!({})).unwrap();
        assert_eq!(rules.len(), 1);

        let probe = parser.liveness_probe(&json!({"path": "/ready"})).unwrap().unwrap();
        assert_eq!(probe.http_get.unwrap().path.as_deref(), Some("/ready"));
        assert_eq!(parser.readiness_probe(&Value::Null).unwrap(), None);
        assert_eq!(parser.startup_probe(&Value::Null).unwrap(), None);
        assert!(parser.environment_variables(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn generic_parser_propagates_shape_errors() {
        let parser = full_parser();
        assert!(parser.ports("test", &json!("hi")).is_err());
        assert!(parser.get_rbac_rules(&json!("hi")).is_err());
        assert!(parser.liveness_probe(&json!("hi")).is_err());
        assert!(parser.get_default_config(&json!("hi")).is_err());
    }

    /// Story: defaulting fills the endpoint but keeps keys the parser doesn't model
    #[test]
    fn story_defaults_preserve_unknown_keys() {
        let parser = full_parser();
        let raw = json!({"tls": {"insecure": true}, "path": "/x"});
        let defaulted = parser.get_default_config(&raw).unwrap();
        assert_eq!(
            defaulted,
            json!({"tls": {"insecure": true}, "path": "/x", "endpoint": "0.0.0.0:1234"})
        );
    }

    #[test]
    fn defaults_are_skipped_without_an_address_or_port() {
        let no_addr: GenericParser<TestConfig> = Builder::new()
            .with_name("test")
            .with_port(1234)
            .with_defaults_applier(test_defaults)
            .must_build();
        assert_eq!(no_addr.get_default_config(&json!({})).unwrap(), json!({}));

        let no_port: GenericParser<TestConfig> = Builder::new()
            .with_name("test")
            .with_default_rec_address("0.0.0.0")
            .with_defaults_applier(test_defaults)
            .must_build();
        assert_eq!(no_port.get_default_config(&Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn parser_without_functions_derives_nothing() {
        let parser: GenericParser<TestConfig> = Builder::new().with_name("bare").must_build();
        assert!(parser.ports("bare", &json!({"endpoint": ":80"})).unwrap().is_empty());
        assert!(parser.get_rbac_rules(&Value::Null).unwrap().is_empty());
        let ctx = CollectorContext::new("otel", "default");
        assert!(parser.rbac_roles(&ctx, "bare", &Value::Null).unwrap().is_empty());
        assert!(parser.rbac_role_bindings(&ctx, "bare", &Value::Null).unwrap().is_empty());
    }

    #[test]
    fn nop_parser_returns_nothing() {
        let nop = Nop::new("batch/2");
        let raw = json!({"timeout": "1s"});
        assert_eq!(nop.parser_type(), "batch");
        assert_eq!(nop.parser_name(), "__batch/2");
        assert_eq!(nop.get_default_config(&raw).unwrap(), raw);
        assert!(nop.ports("batch/2", &raw).unwrap().is_empty());
        assert!(nop.get_rbac_rules(&raw).unwrap().is_empty());
        assert_eq!(nop.liveness_probe(&raw).unwrap(), None);
        assert!(nop.environment_variables(&raw).unwrap().is_empty());
    }

    #[test]
    fn merge_replaces_scalars_and_descends_into_maps() {
        let raw = json!({"protocols": {"grpc": null, "http": {"cors": {}}}});
        let defaults = json!({"protocols": {"grpc": {"endpoint": "0.0.0.0:4317"}, "http": {"endpoint": "0.0.0.0:4318"}}});
        assert_eq!(
            merge_defaults(&raw, defaults),
            json!({"protocols": {
                "grpc": {"endpoint": "0.0.0.0:4317"},
                "http": {"cors": {}, "endpoint": "0.0.0.0:4318"}
            }})
        );
    }

    #[test]
    fn collector_context_defaults_its_service_account() {
        let ctx = CollectorContext::new("otel", "observability");
        assert_eq!(ctx.service_account, "otel-collector");
        let ctx = ctx.with_service_account("custom");
        assert_eq!(ctx.service_account, "custom");
    }
}
