//! Built-in processor parsers

pub mod k8sattributes;
pub mod resourcedetection;

use std::sync::Arc;

use crate::parser::Parser;

/// Every built-in processor parser
pub fn parsers() -> Vec<Arc<dyn Parser>> {
    vec![
        Arc::new(k8sattributes::parser()),
        Arc::new(resourcedetection::parser()),
    ]
}
