//! Builder for [`GenericParser`]s
//!
//! A parser is a default Service port plus a set of plain functions, one per
//! derived artifact. The built-in tables chain `with_*` calls and finish with
//! [`Builder::must_build`]; anything assembled from runtime input should use
//! [`Builder::build`].

use k8s_openapi::api::core::v1::ServicePort;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

use otelop_common::{naming, Error, Result};

use crate::component::UNSET_PORT;
use crate::parser::{
    ComponentConfig, Defaulter, EnvVarGenerator, GenericParser, PortParser, ProbeGenerator,
    RbacRuleGenerator, RoleBindingGenerator, RoleGenerator,
};

/// Accumulated defaults and derivation functions for one component type
pub struct Settings<C> {
    pub(crate) name: String,
    pub(crate) port: i32,
    pub(crate) protocol: Option<String>,
    pub(crate) app_protocol: Option<String>,
    pub(crate) target_port: i32,
    pub(crate) node_port: i32,
    pub(crate) default_rec_addr: String,
    pub(crate) port_parser: Option<PortParser<C>>,
    pub(crate) rbac_gen: Option<RbacRuleGenerator<C>>,
    pub(crate) role_gen: Option<RoleGenerator<C>>,
    pub(crate) role_binding_gen: Option<RoleBindingGenerator<C>>,
    pub(crate) liveness_gen: Option<ProbeGenerator<C>>,
    pub(crate) readiness_gen: Option<ProbeGenerator<C>>,
    pub(crate) startup_gen: Option<ProbeGenerator<C>>,
    pub(crate) env_var_gen: Option<EnvVarGenerator<C>>,
    pub(crate) defaults_applier: Option<Defaulter<C>>,
}

impl<C> Default for Settings<C> {
    fn default() -> Self {
        Self {
            name: String::new(),
            port: UNSET_PORT,
            protocol: None,
            app_protocol: None,
            target_port: UNSET_PORT,
            node_port: UNSET_PORT,
            default_rec_addr: String::new(),
            port_parser: None,
            rbac_gen: None,
            role_gen: None,
            role_binding_gen: None,
            liveness_gen: None,
            readiness_gen: None,
            startup_gen: None,
            env_var_gen: None,
            defaults_applier: None,
        }
    }
}

impl<C> Settings<C> {
    /// The component's default Service port.
    ///
    /// Built fresh on every call so callers can modify it freely.
    pub fn service_port(&self) -> ServicePort {
        ServicePort {
            name: Some(naming::port_name(&self.name, self.port)),
            port: self.port,
            protocol: self.protocol.clone(),
            app_protocol: self.app_protocol.clone(),
            target_port: (self.target_port > UNSET_PORT).then_some(IntOrString::Int(self.target_port)),
            node_port: (self.node_port > UNSET_PORT).then_some(self.node_port),
            ..Default::default()
        }
    }

    /// Component name the settings were built for
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default port, zero when the component has none
    pub fn port(&self) -> i32 {
        self.port
    }

    /// Recommended listen address, empty when the component has none
    pub fn default_rec_addr(&self) -> &str {
        &self.default_rec_addr
    }
}

/// Chained builder for a [`GenericParser`]
pub struct Builder<C> {
    settings: Settings<C>,
}

impl<C> Default for Builder<C> {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
        }
    }
}

impl<C: ComponentConfig> Builder<C> {
    /// Start from empty settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.settings.name = name.into();
        self
    }

    pub fn with_port(mut self, port: i32) -> Self {
        self.settings.port = port;
        self
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.settings.protocol = Some(protocol.into());
        self
    }

    pub fn with_app_protocol(mut self, app_protocol: impl Into<String>) -> Self {
        self.settings.app_protocol = Some(app_protocol.into());
        self
    }

    pub fn with_target_port(mut self, target_port: i32) -> Self {
        self.settings.target_port = target_port;
        self
    }

    pub fn with_node_port(mut self, node_port: i32) -> Self {
        self.settings.node_port = node_port;
        self
    }

    /// Address used when defaulting a missing endpoint
    pub fn with_default_rec_address(mut self, addr: impl Into<String>) -> Self {
        self.settings.default_rec_addr = addr.into();
        self
    }

    pub fn with_port_parser(mut self, port_parser: PortParser<C>) -> Self {
        self.settings.port_parser = Some(port_parser);
        self
    }

    pub fn with_rbac_gen(mut self, rbac_gen: RbacRuleGenerator<C>) -> Self {
        self.settings.rbac_gen = Some(rbac_gen);
        self
    }

    pub fn with_role_gen(mut self, role_gen: RoleGenerator<C>) -> Self {
        self.settings.role_gen = Some(role_gen);
        self
    }

    pub fn with_role_binding_gen(mut self, role_binding_gen: RoleBindingGenerator<C>) -> Self {
        self.settings.role_binding_gen = Some(role_binding_gen);
        self
    }

    pub fn with_liveness_gen(mut self, liveness_gen: ProbeGenerator<C>) -> Self {
        self.settings.liveness_gen = Some(liveness_gen);
        self
    }

    pub fn with_readiness_gen(mut self, readiness_gen: ProbeGenerator<C>) -> Self {
        self.settings.readiness_gen = Some(readiness_gen);
        self
    }

    pub fn with_startup_gen(mut self, startup_gen: ProbeGenerator<C>) -> Self {
        self.settings.startup_gen = Some(startup_gen);
        self
    }

    pub fn with_env_var_gen(mut self, env_var_gen: EnvVarGenerator<C>) -> Self {
        self.settings.env_var_gen = Some(env_var_gen);
        self
    }

    pub fn with_defaults_applier(mut self, defaults_applier: Defaulter<C>) -> Self {
        self.settings.defaults_applier = Some(defaults_applier);
        self
    }

    /// Finish the parser. Fails when no name was given.
    pub fn build(self) -> Result<GenericParser<C>> {
        if self.settings.name.is_empty() {
            return Err(Error::invalid_settings("no name specified"));
        }
        Ok(GenericParser::from_settings(self.settings))
    }

    /// Finish a parser from a static table.
    ///
    /// # Panics
    ///
    /// Panics when [`Builder::build`] fails.
    pub fn must_build(self) -> GenericParser<C> {
        match self.build() {
            Ok(parser) => parser,
            Err(e) => panic!("{e}"),
        }
    }
}
