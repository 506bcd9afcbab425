//! Error types for component parsing and configuration rewriting
//!
//! Every failure is local to a single component or document. Callers decide
//! whether a failure aborts the whole aggregation or is logged and skipped,
//! so variants carry enough context to produce a useful log line on their own.

use thiserror::Error;

/// Main error type for the component parsers and config adapters
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Raw configuration was not a mapping where one was required
    #[error("expected a map, got '{got}'")]
    Shape {
        /// Kind of the value that was found instead (e.g. "string", "array")
        got: String,
    },

    /// Raw configuration was a mapping but did not fit the component's schema
    #[error("failed to decode configuration: {message}")]
    Decode {
        /// Description of what failed
        message: String,
    },

    /// No endpoint or listen address carried a port and no default exists
    #[error("port should not be empty")]
    PortNotFound,

    /// Trailing port digits did not fit in a 32-bit signed integer
    #[error("port value out of range: {value}")]
    PortOverflow {
        /// The digits as they appeared in the endpoint
        value: String,
    },

    /// A multi-protocol component named a protocol it does not know
    #[error("unknown protocol set: {protocol}")]
    UnknownProtocol {
        /// The protocol key from the configuration
        protocol: String,
    },

    /// A parser builder was missing required settings
    #[error("invalid settings struct, {message}")]
    InvalidSettings {
        /// Description of what is missing
        message: String,
    },

    /// Whole-document structural error (missing or mis-shaped sections)
    #[error("{message}")]
    Config {
        /// Description of what is wrong
        message: String,
    },

    /// YAML could not be parsed
    #[error("yaml error: {message}")]
    Yaml {
        /// Description of what failed
        message: String,
    },

    /// A value could not be serialized back into the generic form
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a shape error for a value of the given kind
    pub fn shape(got: impl Into<String>) -> Self {
        Self::Shape { got: got.into() }
    }

    /// Create a decode error with the given message
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    /// Create a port overflow error for the given digits
    pub fn port_overflow(value: impl Into<String>) -> Self {
        Self::PortOverflow {
            value: value.into(),
        }
    }

    /// Create an unknown protocol error
    pub fn unknown_protocol(protocol: impl Into<String>) -> Self {
        Self::UnknownProtocol {
            protocol: protocol.into(),
        }
    }

    /// Create an invalid settings error
    pub fn invalid_settings(msg: impl Into<String>) -> Self {
        Self::InvalidSettings {
            message: msg.into(),
        }
    }

    /// Create a document structure error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a YAML error
    pub fn yaml(msg: impl Into<String>) -> Self {
        Self::Yaml {
            message: msg.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// True for the "no port anywhere" failure that silent parsers swallow
    pub fn is_port_not_found(&self) -> bool {
        matches!(self, Self::PortNotFound)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() {
            Self::decode(err.to_string())
        } else {
            Self::serialization(err.to_string())
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::yaml(err.to_string())
    }
}
