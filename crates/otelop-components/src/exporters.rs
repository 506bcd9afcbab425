//! Built-in exporter parsers

use std::sync::Arc;

use crate::component::DEFAULT_REC_ADDRESS;
use crate::parser::Parser;
use crate::single_endpoint::new_single_endpoint_parser;

/// Port the prometheus exporter serves metrics on by default
pub const PROMETHEUS_EXPORTER_PORT: i32 = 8889;

/// Every built-in exporter parser
pub fn parsers() -> Vec<Arc<dyn Parser>> {
    vec![Arc::new(
        new_single_endpoint_parser("prometheus", PROMETHEUS_EXPORTER_PORT)
            .with_target_port(PROMETHEUS_EXPORTER_PORT)
            .with_default_rec_address(DEFAULT_REC_ADDRESS)
            .must_build(),
    )]
}
