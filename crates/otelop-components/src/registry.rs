//! Registries mapping component types to parsers
//!
//! There is one registry per component kind. [`ComponentRegistry::builtin`]
//! fills all four from the built-in tables; after that the registries are
//! only read, so a single instance can be shared across threads.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::component::{component_type, UNSET_PORT};
use crate::parser::{Nop, Parser};
use crate::single_endpoint::new_silent_single_endpoint_parser;
use crate::{exporters, extensions, processors, receivers};

/// Kind of pipeline component, matching the top-level config sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Receiver,
    Processor,
    Exporter,
    Extension,
}

impl ComponentKind {
    /// All kinds in pipeline order
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Receiver,
        ComponentKind::Processor,
        ComponentKind::Exporter,
        ComponentKind::Extension,
    ];

    /// Top-level config section holding components of this kind
    pub fn section(&self) -> &'static str {
        match self {
            Self::Receiver => "receivers",
            Self::Processor => "processors",
            Self::Exporter => "exporters",
            Self::Extension => "extensions",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Receiver => "receiver",
            Self::Processor => "processor",
            Self::Exporter => "exporter",
            Self::Extension => "extension",
        };
        write!(f, "{s}")
    }
}

/// Parsers for one component kind, keyed by component type
pub struct Registry {
    kind: ComponentKind,
    parsers: HashMap<String, Arc<dyn Parser>>,
}

impl Registry {
    /// Empty registry for `kind`
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            parsers: HashMap::new(),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Register a parser under its [`Parser::parser_type`], replacing any previous one
    pub fn register(&mut self, parser: Arc<dyn Parser>) {
        self.parsers.insert(parser.parser_type().to_string(), parser);
    }

    /// Whether a parser exists for the type of `name`
    pub fn is_registered(&self, name: &str) -> bool {
        self.parsers.contains_key(component_type(name))
    }

    /// Parser for the component called `name`.
    ///
    /// Unknown receivers get a silent single-endpoint parser without a default
    /// port; everything else unknown gets a [`Nop`].
    pub fn parser_for(&self, name: &str) -> Arc<dyn Parser> {
        let ty = component_type(name);
        if let Some(parser) = self.parsers.get(ty) {
            return Arc::clone(parser);
        }
        match self.kind {
            ComponentKind::Receiver => {
                Arc::new(new_silent_single_endpoint_parser(ty, UNSET_PORT).must_build())
            }
            _ => Arc::new(Nop::new(ty)),
        }
    }

    /// Registered component types, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("kind", &self.kind)
            .field("types", &self.types())
            .finish()
    }
}

/// The four registries a collector configuration is parsed against
#[derive(Debug)]
pub struct ComponentRegistry {
    pub receivers: Registry,
    pub processors: Registry,
    pub exporters: Registry,
    pub extensions: Registry,
}

impl ComponentRegistry {
    /// Registries with nothing registered
    pub fn empty() -> Self {
        Self {
            receivers: Registry::new(ComponentKind::Receiver),
            processors: Registry::new(ComponentKind::Processor),
            exporters: Registry::new(ComponentKind::Exporter),
            extensions: Registry::new(ComponentKind::Extension),
        }
    }

    /// Registries holding every built-in parser
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for parser in receivers::parsers() {
            registry.receivers.register(parser);
        }
        for parser in processors::parsers() {
            registry.processors.register(parser);
        }
        for parser in exporters::parsers() {
            registry.exporters.register(parser);
        }
        for parser in extensions::parsers() {
            registry.extensions.register(parser);
        }
        registry
    }

    /// Registry for `kind`
    pub fn for_kind(&self, kind: ComponentKind) -> &Registry {
        match kind {
            ComponentKind::Receiver => &self.receivers,
            ComponentKind::Processor => &self.processors,
            ComponentKind::Exporter => &self.exporters,
            ComponentKind::Extension => &self.extensions,
        }
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
