//! Built-in extension parsers

pub mod healthcheck;
pub mod jaeger_query;
pub mod k8sobserver;

use std::sync::Arc;

use crate::parser::Parser;

/// Every built-in extension parser
pub fn parsers() -> Vec<Arc<dyn Parser>> {
    vec![
        Arc::new(healthcheck::v1_parser()),
        Arc::new(healthcheck::v2_parser()),
        Arc::new(jaeger_query::parser()),
        Arc::new(k8sobserver::parser()),
    ]
}
