//! Error constructors carrying the messages users already know from the operator

use otelop_common::Error;

pub(crate) fn no_component(component: &str) -> Error {
    Error::config(format!("no {component} available as part of the configuration"))
}

pub(crate) fn not_a_map(component: &str) -> Error {
    Error::config(format!(
        "{component} property in the configuration doesn't contain valid {component}"
    ))
}

pub(crate) fn not_a_list(component: &str) -> Error {
    Error::config(format!("{component} must be a list in the config"))
}

pub(crate) fn not_a_map_at(component: &str, index: usize) -> Error {
    at_index(component, index, "map")
}

pub(crate) fn not_a_list_at(component: &str, index: usize) -> Error {
    at_index(component, index, "index")
}

pub(crate) fn not_a_string_at(component: &str, index: usize) -> Error {
    at_index(component, index, "string")
}

fn at_index(component: &str, index: usize, what: &str) -> Error {
    Error::config(format!(
        "index {index}: {component} property in the configuration doesn't contain a valid {what}: {component}"
    ))
}
