//! Naming helpers for derived Kubernetes objects
//!
//! Service port names must be DNS-1123 labels of at most 15 characters, and
//! object names at most 63. Component names (`otlp/internal`, `splunk_hec`)
//! rarely satisfy either rule as written, so everything derived from them is
//! sanitised here.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum length of a Service port name
pub const MAX_PORT_NAME_LEN: usize = 15;

/// Maximum length of an object name
pub const MAX_OBJECT_NAME_LEN: usize = 63;

static DNS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("DNS label pattern is valid")
});

/// Derive a Service port name from a component name.
///
/// `/` and `_` become `-`. Anything still too long or not a DNS label falls
/// back to `port-<port>`.
pub fn port_name(component_name: &str, port: i32) -> String {
    if component_name.len() > MAX_PORT_NAME_LEN {
        return format!("port-{port}");
    }
    let candidate = component_name.replace(['/', '_'], "-");
    if !DNS_LABEL.is_match(&candidate) {
        return format!("port-{port}");
    }
    candidate
}

/// Lowercase `name` and replace every character outside `[a-z0-9]` with `-`.
///
/// A leading or trailing invalid character becomes `a` so the result always
/// starts and ends with an alphanumeric.
pub fn dns_name(name: &str) -> String {
    let lower = name.to_lowercase();
    let last = lower.chars().count().saturating_sub(1);
    lower
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() {
                c
            } else if i == 0 || i == last {
                'a'
            } else {
                '-'
            }
        })
        .collect()
}

/// Join `parts` with `-`, append `suffix`, and shorten the parts so the result
/// fits in `max` characters.
///
/// Excess is taken from the first part first; a part shorter than the
/// remaining excess is dropped to empty and the rest comes from the next one.
pub fn truncate(parts: &[&str], suffix: &str, max: usize) -> String {
    let render = |parts: &[String]| {
        let mut out = parts.join("-");
        out.push_str(suffix);
        out
    };

    let mut owned: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
    let full = render(&owned);
    let mut excess = full.len().saturating_sub(max);
    if excess == 0 {
        return full;
    }

    for part in owned.iter_mut() {
        if excess == 0 {
            break;
        }
        if part.len() > excess {
            let keep = floor_char_boundary(part, part.len() - excess);
            part.truncate(keep);
            excess = 0;
        } else {
            excess -= part.len();
            part.clear();
        }
    }
    render(&owned)
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Name of the namespaced Role a component needs for the given collector
pub fn role(collector: &str, component: &str) -> String {
    dns_name(&truncate(&[collector, component], "-role", MAX_OBJECT_NAME_LEN))
}

/// Name of the RoleBinding that grants [`role`] to the collector's service account
pub fn role_binding(collector: &str, component: &str) -> String {
    dns_name(&truncate(
        &[collector, component],
        "-rolebinding",
        MAX_OBJECT_NAME_LEN,
    ))
}

/// Name of the target allocator Service for the given collector
pub fn target_allocator_service(collector: &str) -> String {
    dns_name(&truncate(&[collector], "-targetallocator", MAX_OBJECT_NAME_LEN))
}

/// Name of the collector's service account
pub fn service_account(collector: &str) -> String {
    dns_name(&truncate(&[collector], "-collector", MAX_OBJECT_NAME_LEN))
}
